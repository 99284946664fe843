mod dispatcher;
mod intent;

pub use dispatcher::Dispatcher;
pub use intent::{Intent, Outcome};
