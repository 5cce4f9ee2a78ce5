pub mod candidate;
pub mod config;
pub mod console;
pub mod engine;
pub mod instruction;
pub mod organize;
pub mod placer;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod subtitle;
pub mod template;
pub mod tmdb;
pub mod video;
