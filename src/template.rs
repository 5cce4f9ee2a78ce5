use regex::{Captures, Regex};
use std::{collections::BTreeMap, sync::LazyLock};

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("Failed to create regex pattern for template placeholder")
});

pub type Params = BTreeMap<&'static str, String>;

/// Replace every `{{ key }}` with its value. Unknown keys render as empty.
pub fn render(template: &str, params: &Params) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |captures: &Captures| {
            params
                .get(&captures[1])
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params::from([("name", "The Office".to_string()), ("season", "02".to_string())])
    }

    #[test]
    fn test_render() {
        assert_eq!(
            render("{{ name }}/Season {{season}}", &params()),
            "The Office/Season 02"
        );
    }

    #[test]
    fn test_render_unknown_placeholder_is_empty() {
        assert_eq!(render("{{ name }} ({{ year }})", &params()), "The Office ()");
    }

    #[test]
    fn test_render_leaves_plain_text_alone() {
        assert_eq!(render("Movies {name} }}", &params()), "Movies {name} }}");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = "{{ name }} - s{{ season }}";
        assert_eq!(render(template, &params()), render(template, &params()));
    }
}
