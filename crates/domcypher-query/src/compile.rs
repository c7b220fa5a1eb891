//! Query → [`SearchPlan`] compilation.
//!
//! Two pattern shapes are accepted:
//!
//! - `(n:Label)`: the condition is matched graph-wide and every node is a
//!   candidate; ancestor inclusion is not required.
//! - `(target:Label)-[..]-(anchor:Label)`: the condition is matched on
//!   nodes carrying the second node's labels, candidates carry the first
//!   node's labels and must contain the anchor. Arrow direction does not
//!   change these roles.
//!
//! A compound WHERE is accepted but only one condition is compiled: the
//! first one naming the anchor variable, else the first one.
//!
//! Everything else is a [`CompileError`].

use std::collections::HashSet;

use domcypher_core::{CompileError, Result, SearchConfig};
use domcypher_graph::SemanticLabel;
use tracing::{debug, info};

use crate::ast::{Condition, Direction, NodePattern, Operand, Operator, Pattern, Query, Value};
use crate::parser::parse;
use crate::plan::{MatchKind, PayloadField, SearchPlan, TextMatch};

type CResult<T> = std::result::Result<T, CompileError>;

/// Parse and compile query text. Nothing touches a graph before this succeeds.
pub fn compile(text: &str, config: &SearchConfig) -> Result<SearchPlan> {
    let query = parse(text)?;
    debug!("Parsed query: {:?}", query);
    let plan = compile_query(query, config)?;
    info!(
        "Compiled query: {} {:?} on {:?}, targets {:?}",
        plan.text_match.match_kind, plan.text_match.query, plan.text_match.anchor_types, plan.target_types
    );
    Ok(plan)
}

/// Compile an already-parsed query.
pub fn compile_query(mut query: Query, config: &SearchConfig) -> CResult<SearchPlan> {
    let mut pattern = match query.matches.len() {
        0 => return Err(CompileError::NoMatchClause),
        1 => query.matches.remove(0),
        n => return Err(CompileError::MultipleMatchClauses(n)),
    };
    let shape = (pattern.nodes.len(), pattern.edges.len());
    if shape != (1, 0) && shape != (2, 1) {
        return Err(CompileError::UnsupportedShape {
            nodes: shape.0,
            edges: shape.1,
        });
    }

    let variables = name_variables(&mut pattern);
    let labels = pattern
        .nodes
        .iter()
        .map(node_labels)
        .collect::<CResult<Vec<_>>>()?;

    // (target index, anchor index) into the node list
    let (target, anchor) = match pattern.edges.first() {
        None => (None, 0),
        Some(edge) => {
            if let Some(ty) = &edge.edge_type {
                return Err(CompileError::UnsupportedEdgeType(ty.clone()));
            }
            if let Some(hops) = edge.hops {
                if edge.direction == Direction::Both {
                    return Err(CompileError::BidirectionalHopRange);
                }
                if let Some(max) = hops.max {
                    if max < hops.min {
                        return Err(CompileError::InvalidHopRange { min: hops.min, max });
                    }
                }
            }
            (Some(0), 1)
        }
    };
    let anchor_var = pattern.nodes[anchor].variable.clone().unwrap_or_default();

    let conditions: Vec<&Condition> = query
        .predicate
        .as_ref()
        .map(|p| p.conditions())
        .unwrap_or_default();
    let condition = select_condition(&conditions, &anchor_var).ok_or(CompileError::MissingCondition)?;
    for ignored in conditions.iter().filter(|c| !std::ptr::eq(**c, condition)) {
        debug!("Ignoring WHERE condition on {} ({})", ignored.entity, ignored.op);
    }
    let text_match = text_match(condition, &variables, config)?;

    for item in &query.returns.items {
        if !variables.contains(&item.variable) {
            return Err(CompileError::UnknownVariable(item.variable.clone()));
        }
    }

    let (anchor_types, target_types, require_ancestor_inclusion) = match target {
        None => (Vec::new(), Vec::new(), false),
        Some(t) => (labels[anchor].clone(), labels[t].clone(), true),
    };

    Ok(SearchPlan {
        page_url: query.use_url,
        text_match: TextMatch {
            anchor_types,
            ..text_match
        },
        target_types,
        top_k_anchors: query.returns.limit.unwrap_or(config.top_k_anchors),
        top_k_neighbors: config.top_k_neighbors,
        skip_anchors: query.returns.skip.unwrap_or(0),
        require_ancestor_inclusion,
        returns: query.returns.items.iter().map(|i| i.to_string()).collect(),
    })
}

/// Give anonymous nodes and edges stable names; returns every declared variable.
fn name_variables(pattern: &mut Pattern) -> HashSet<String> {
    let mut declared = HashSet::new();
    for (i, node) in pattern.nodes.iter_mut().enumerate() {
        let name = node.variable.get_or_insert_with(|| format!("_n{}", i));
        declared.insert(name.clone());
    }
    for (i, edge) in pattern.edges.iter_mut().enumerate() {
        let name = edge.variable.get_or_insert_with(|| format!("_e{}", i));
        declared.insert(name.clone());
    }
    declared
}

fn node_labels(node: &NodePattern) -> CResult<Vec<SemanticLabel>> {
    let name = node.variable.clone().unwrap_or_default();
    if !node.properties.is_empty() {
        return Err(CompileError::UnsupportedPropertyFilter(name));
    }
    if node.labels.is_empty() {
        return Err(CompileError::MissingLabel(name));
    }
    let mut labels: Vec<SemanticLabel> = Vec::new();
    for raw in &node.labels {
        let label: SemanticLabel = raw
            .parse()
            .map_err(|_| CompileError::UnknownLabel(raw.clone()))?;
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    Ok(labels)
}

/// The first condition on the anchor variable, else the first condition.
fn select_condition<'q>(conditions: &[&'q Condition], anchor_var: &str) -> Option<&'q Condition> {
    conditions
        .iter()
        .find(|c| c.entity.variable == anchor_var)
        .or_else(|| conditions.first())
        .copied()
}

fn text_match(condition: &Condition, declared: &HashSet<String>, config: &SearchConfig) -> CResult<TextMatch> {
    let entity = &condition.entity;
    if !declared.contains(&entity.variable) {
        return Err(CompileError::UnknownVariable(entity.variable.clone()));
    }

    let field = match &entity.property {
        None => PayloadField::Text,
        Some(prop) => PayloadField::from_property(prop)
            .ok_or_else(|| CompileError::UnknownProperty(prop.clone()))?,
    };

    let match_kind = match condition.op {
        Operator::Eq => MatchKind::Exact,
        Operator::Contains => MatchKind::Contains,
        op => return Err(CompileError::UnsupportedOperator(op.to_string())),
    };

    let query = match &condition.operand {
        Operand::Value(Value::Str(s)) => s.clone(),
        Operand::Value(Value::Number(n)) => n.clone(),
        Operand::Value(other) => return Err(CompileError::UnsupportedValue(other.to_string())),
        Operand::Entity(e) => return Err(CompileError::UnsupportedValue(e.to_string())),
    };

    Ok(TextMatch {
        query,
        case_insensitive: config.case_insensitive,
        match_kind,
        field,
        anchor_types: Vec::new(),
    })
}
