pub mod error;
pub mod lex_env;
pub mod limits;
pub mod object;
pub mod operations;
pub mod realm;
pub mod value;
