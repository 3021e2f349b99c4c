pub mod diagnostics;
pub mod healthz;
pub mod todos;

pub use diagnostics::{do_panic, test_os};
pub use healthz::healthz;
pub use todos::{create_todo, delete_todos, read_todos, update_todo};
