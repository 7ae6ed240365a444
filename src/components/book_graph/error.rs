use thiserror::Error;

/// Failures at the data and action boundaries of the graph view.
#[derive(Error, Debug)]
pub enum GraphError {
	/// The graph payload was not valid JSON or did not match the schema.
	#[error("invalid graph payload: {0}")]
	InvalidGraph(#[source] serde_json::Error),

	/// An action payload could not be decoded.
	#[error("invalid action payload: {0}")]
	InvalidAction(#[source] serde_json::Error),
}
