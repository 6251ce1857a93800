mod cli;
mod print;

pub(crate) use cli::as_cli;
