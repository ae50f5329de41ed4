//! Configuration diagnostics
//!
//! Non-fatal decisions taken while building metadata (a defaulted reference
//! class, a defaulted join column name, a disabled indirection) are reported
//! as `tracing` events under the `entmap::metadata` target. They are
//! advisory only.

use std::fmt;

/// What a configuration message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogContext {
	/// Reference class defaulted from the attribute's declared type
	ReferenceClass,
	/// Referenced primary key column name defaulted
	PrimaryKeyColumn,
	/// Local foreign key column name defaulted
	ForeignKeyColumn,
	/// Lazy loading requested but not available
	Indirection,
}

impl LogContext {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogContext::ReferenceClass => "reference_class",
			LogContext::PrimaryKeyColumn => "pk_column",
			LogContext::ForeignKeyColumn => "fk_column",
			LogContext::Indirection => "indirection",
		}
	}
}

impl fmt::Display for LogContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Logger handed to the accessors of one metadata build
#[derive(Debug, Clone, Default)]
pub struct MetadataLogger {
	project: Option<String>,
}

impl MetadataLogger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Tag every message with a project name
	pub fn for_project(project: impl Into<String>) -> Self {
		Self {
			project: Some(project.into()),
		}
	}

	pub fn project(&self) -> Option<&str> {
		self.project.as_deref()
	}

	/// Report a defaulted value for `element` (usually `Class.attribute`)
	pub fn log_config_message(&self, context: LogContext, element: &str, value: &str) {
		tracing::debug!(
			target: "entmap::metadata",
			project = self.project.as_deref().unwrap_or_default(),
			context = context.as_str(),
			element,
			value,
			"defaulted {} for {} to {}",
			context,
			element,
			value
		);
	}

	/// Report a phase summary
	pub fn log_phase(&self, phase: &str, entities: usize) {
		tracing::info!(
			target: "entmap::metadata",
			project = self.project.as_deref().unwrap_or_default(),
			phase,
			entities,
			"metadata phase complete"
		);
	}

	/// Report a problem that the configured policy lets through
	pub fn log_warning(&self, element: &str, message: &str) {
		tracing::warn!(
			target: "entmap::metadata",
			project = self.project.as_deref().unwrap_or_default(),
			element,
			"{}",
			message
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::{Arc, Mutex};
	use tracing_subscriber::layer::SubscriberExt as _;
	use tracing_subscriber::util::SubscriberInitExt as _;

	/// Captures `[LEVEL] context message` for every event
	struct LogCapture {
		logs: Arc<Mutex<Vec<String>>>,
	}

	impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
		fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
			#[derive(Default)]
			struct Visitor {
				context: String,
				message: String,
			}

			impl tracing::field::Visit for Visitor {
				fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
					if field.name() == "context" {
						self.context = value.to_string();
					}
				}

				fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
					if field.name() == "message" {
						self.message = format!("{:?}", value);
					}
				}
			}

			let mut visitor = Visitor::default();
			event.record(&mut visitor);
			self.logs.lock().unwrap().push(format!(
				"[{}] {} {}",
				event.metadata().level(),
				visitor.context,
				visitor.message
			));
		}
	}

	#[rstest]
	fn test_config_message_is_a_debug_event() {
		let logs = Arc::new(Mutex::new(Vec::new()));
		let _guard = tracing_subscriber::registry()
			.with(LogCapture { logs: logs.clone() })
			.set_default();

		MetadataLogger::for_project("hr").log_config_message(
			LogContext::ForeignKeyColumn,
			"Employee.manager",
			"MANAGER_ID",
		);

		let captured = logs.lock().unwrap();
		assert_eq!(
			*captured,
			vec!["[DEBUG] fk_column defaulted fk_column for Employee.manager to MANAGER_ID".to_string()]
		);
	}

	#[rstest]
	fn test_warning_level() {
		let logs = Arc::new(Mutex::new(Vec::new()));
		let _guard = tracing_subscriber::registry()
			.with(LogCapture { logs: logs.clone() })
			.set_default();

		MetadataLogger::new().log_warning("A", "Inheritance cycle detected at A");

		let captured = logs.lock().unwrap();
		assert_eq!(captured.len(), 1);
		assert!(captured[0].starts_with("[WARN]"));
		assert!(captured[0].contains("Inheritance cycle"));
	}
}
