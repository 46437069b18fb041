pub mod cli;
pub mod fanout;
pub mod utils;
