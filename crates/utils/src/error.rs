use std::fmt::Display;

use tracing::error;

/// Report an error with tracing, tagged with what we were doing when it happened
pub fn report_error<T>(context: &str, res: &Result<T, impl Display>) {
	if let Err(e) = res {
		error!(%context, "{e:#}");
	}
}
