#[path = "integration/cli.rs"]
mod cli;
#[path = "integration/library.rs"]
mod library;
#[path = "integration/stubs.rs"]
mod stubs;
