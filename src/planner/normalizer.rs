//! Literal normalization for untyped fields
//!
//! A comparison whose field has no declared type and whose literal is a
//! string gets the literal re-parsed as a number when that succeeds. This
//! catches queries like `AGE == '42'` against fields the type registry
//! knows nothing about. Typed fields are left for type-specific
//! normalization.

use std::sync::Arc;

use super::ast::{Expr, Literal};
use super::errors::{PlannerError, PlannerResult};
use super::numeric::parse_numeric_literal;
use super::registry::FieldTypeRegistry;
use crate::observability::{Event, Logger, MetricsRegistry};

/// Output of a normalization pass
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Rewritten tree. Shares every unchanged subtree with the input.
    pub expr: Arc<Expr>,
    /// Number of literals converted
    pub rewritten: usize,
}

impl Normalized {
    pub fn changed(&self) -> bool {
        self.rewritten > 0
    }
}

/// Rewrites string literals on untyped fields into numbers
pub struct LiteralNormalizer<'a> {
    registry: &'a FieldTypeRegistry,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<'a> LiteralNormalizer<'a> {
    /// Fails with a configuration error if no type registry is configured
    pub fn new(registry: Option<&'a FieldTypeRegistry>) -> PlannerResult<Self> {
        let registry = registry.ok_or_else(|| {
            PlannerError::configuration(
                "field type registry is not configured; literal normalization cannot run",
            )
        })?;
        Ok(Self {
            registry,
            metrics: None,
        })
    }

    /// Record rewrite counts in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns a normalized copy of `expr`. The input is never modified.
    pub fn normalize(&self, expr: &Arc<Expr>) -> Normalized {
        let mut rewritten = 0;
        let expr = self
            .rewrite(expr, &mut rewritten)
            .unwrap_or_else(|| Arc::clone(expr));

        if let Some(metrics) = &self.metrics {
            metrics.add_literals_rewritten(rewritten as u64);
        }
        Normalized { expr, rewritten }
    }

    /// `None` when the subtree is unchanged
    fn rewrite(&self, expr: &Arc<Expr>, rewritten: &mut usize) -> Option<Arc<Expr>> {
        match expr.as_ref() {
            Expr::And { children } => self
                .rewrite_all(children, rewritten)
                .map(|children| Arc::new(Expr::And { children })),
            Expr::Or { children } => self
                .rewrite_all(children, rewritten)
                .map(|children| Arc::new(Expr::Or { children })),
            Expr::Not { child } => self
                .rewrite(child, rewritten)
                .map(|child| Arc::new(Expr::Not { child })),
            Expr::Compare { op, field, literal } => {
                let text = literal.as_str()?;
                if self.registry.has_declared_type(field) {
                    return None;
                }
                let number = parse_numeric_literal(text)?;

                Logger::event(
                    Event::LiteralRewritten,
                    &[
                        ("field", field.as_str()),
                        ("op", op.symbol()),
                        ("from", text),
                        ("to", &number.to_string()),
                    ],
                );
                *rewritten += 1;
                Some(Arc::new(Expr::Compare {
                    op: *op,
                    field: field.clone(),
                    literal: Literal::Number(number),
                }))
            }
            Expr::Function { .. } | Expr::Field { .. } | Expr::Value { .. } => None,
        }
    }

    fn rewrite_all(&self, children: &[Arc<Expr>], rewritten: &mut usize) -> Option<Vec<Arc<Expr>>> {
        let replaced: Vec<Option<Arc<Expr>>> = children
            .iter()
            .map(|child| self.rewrite(child, rewritten))
            .collect();

        if replaced.iter().all(Option::is_none) {
            return None;
        }
        Some(
            replaced
                .into_iter()
                .zip(children)
                .map(|(new, old)| new.unwrap_or_else(|| Arc::clone(old)))
                .collect(),
        )
    }
}

/// Normalizes `expr` against an optional registry in one call
pub fn normalize_literals(
    registry: Option<&FieldTypeRegistry>,
    expr: &Arc<Expr>,
) -> PlannerResult<Normalized> {
    Ok(LiteralNormalizer::new(registry)?.normalize(expr))
}
