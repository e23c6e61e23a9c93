//! Text emitters for schemagate models.
//!
//! Every emitter renders an [`OrderedModel`], a model paired with its
//! resolved table order, so referenced tables are always written before
//! the tables that reference them.

pub mod errors;
pub mod gateway;
pub mod options;
pub mod ordered;
pub mod sql;

pub use errors::{EmitError, Result};
pub use gateway::GatewayEmitter;
pub use options::{EmitOptions, QuoteStyle};
pub use ordered::OrderedModel;
pub use sql::SqlEmitter;

use schemagate_core::Model;

/// Renders an ordered model as text.
pub trait Emitter {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Reject models this emitter cannot render faithfully. Runs before
    /// [`Emitter::emit`].
    fn check(&self, _model: &OrderedModel<'_>) -> Result<()> {
        Ok(())
    }

    fn emit(&self, model: &OrderedModel<'_>, out: &mut String) -> std::fmt::Result;
}

/// Resolve the table order of `model` and render it with `emitter`.
pub fn render(emitter: &dyn Emitter, model: &Model) -> Result<String> {
    let ordered = OrderedModel::resolve(model)?;
    emitter.check(&ordered)?;
    let mut out = String::new();
    emitter.emit(&ordered, &mut out)?;
    tracing::info!(
        event = "emit_finished",
        emitter = emitter.name(),
        tables = ordered.order().len(),
        bytes = out.len()
    );
    Ok(out)
}

/// Render `CREATE TABLE` DDL for every table.
pub fn emit_sql(model: &Model, options: &EmitOptions) -> Result<String> {
    render(&SqlEmitter::new(options.clone()), model)
}

/// Render gateway class source for every table.
pub fn emit_gateway_source(model: &Model, options: &EmitOptions) -> Result<String> {
    render(&GatewayEmitter::new(options.clone()), model)
}
