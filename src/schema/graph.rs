//! Schema dependency graph for FK-aware statement ordering.
//!
//! Provides:
//! - Dependency graph construction from schema FK relationships
//! - Strongly connected components to find FK cycles (self-references included)
//! - Deterministic topological sorting over the acyclic edges
//! - The two-phase create plan: tables first, deferred constraints after

use super::{ForeignKey, Schema, Table, TableId};
use std::collections::BTreeSet;
use std::fmt;

/// How foreign keys are emitted in the create script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConstraintMode {
    /// Inside CREATE TABLE, except FKs on a cycle
    #[default]
    Inline,
    /// Every FK as ALTER TABLE after all tables exist
    Deferred,
}

impl std::str::FromStr for ConstraintMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(ConstraintMode::Inline),
            "deferred" | "alter" => Ok(ConstraintMode::Deferred),
            _ => Err(format!(
                "Unknown constraint mode: {}. Valid options: inline, deferred",
                s
            )),
        }
    }
}

impl fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintMode::Inline => write!(f, "inline"),
            ConstraintMode::Deferred => write!(f, "deferred"),
        }
    }
}

/// Reference to one foreign key: owning table plus position in its FK list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FkRef {
    pub table: TableId,
    pub index: usize,
}

/// Schema dependency graph built from foreign key relationships.
///
/// An edge child → parent means the child table has an FK referencing
/// the parent. Self-references are kept as loops so they count as cycles.
#[derive(Debug)]
pub struct SchemaGraph<'a> {
    /// The underlying schema
    pub schema: &'a Schema,
    /// For each table, the tables it references (deduplicated)
    pub parents: Vec<Vec<TableId>>,
    /// For each table, the tables referencing it (deduplicated)
    pub children: Vec<Vec<TableId>>,
    /// Strongly connected component index per table
    component: Vec<usize>,
    /// Component index -> whether it contains a cycle
    component_cyclic: Vec<bool>,
}

/// Result of topological sort
#[derive(Debug)]
pub struct TopoSortResult {
    /// Every table, parents before children once cyclic edges are removed
    pub order: Vec<TableId>,
    /// Tables that sit on at least one FK cycle
    pub cyclic_tables: Vec<TableId>,
}

impl<'a> SchemaGraph<'a> {
    /// Build a dependency graph from a schema
    pub fn from_schema(schema: &'a Schema) -> Self {
        let n = schema.len();
        let mut parents: Vec<Vec<TableId>> = vec![Vec::new(); n];
        let mut children: Vec<Vec<TableId>> = vec![Vec::new(); n];

        for table in schema.iter() {
            let child_id = table.id;
            for fk in &table.foreign_keys {
                let parent_id = fk.referenced_table_id;
                if !parents[child_id.0 as usize].contains(&parent_id) {
                    parents[child_id.0 as usize].push(parent_id);
                }
                if !children[parent_id.0 as usize].contains(&child_id) {
                    children[parent_id.0 as usize].push(child_id);
                }
            }
        }

        let (component, component_count) = strongly_connected(&parents);
        let mut component_size = vec![0usize; component_count];
        for &c in &component {
            component_size[c] += 1;
        }
        let mut component_cyclic: Vec<bool> = component_size.iter().map(|&s| s > 1).collect();
        for (i, ps) in parents.iter().enumerate() {
            if ps.contains(&TableId(i as u32)) {
                component_cyclic[component[i]] = true;
            }
        }

        Self {
            schema,
            parents,
            children,
            component,
            component_cyclic,
        }
    }

    /// Get the number of tables in the graph
    pub fn len(&self) -> usize {
        self.schema.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Get the table name for a table ID
    pub fn table_name(&self, id: TableId) -> Option<&str> {
        self.schema.table(id).map(|t| t.name.as_str())
    }

    /// Whether the edge child → parent lies on an FK cycle
    pub fn is_cyclic_edge(&self, child: TableId, parent: TableId) -> bool {
        let (c, p) = (child.0 as usize, parent.0 as usize);
        self.component[c] == self.component[p] && self.component_cyclic[self.component[c]]
    }

    /// Whether a foreign key of `table` participates in a cycle
    pub fn is_cyclic_fk(&self, table: &Table, fk: &ForeignKey) -> bool {
        self.is_cyclic_edge(table.id, fk.referenced_table_id)
    }

    /// Check if a table has a self-referential FK
    pub fn has_self_reference(&self, id: TableId) -> bool {
        self.parents[id.0 as usize].contains(&id)
    }

    /// Topological sort using Kahn's algorithm over the acyclic edges.
    ///
    /// Ties are broken by table name, then table ID, so the order only
    /// depends on the schema content.
    pub fn topo_sort(&self) -> TopoSortResult {
        let n = self.len();
        let mut in_degree: Vec<usize> = vec![0; n];
        for (i, parents) in self.parents.iter().enumerate() {
            let child = TableId(i as u32);
            in_degree[i] = parents
                .iter()
                .filter(|&&p| !self.is_cyclic_edge(child, p))
                .count();
        }

        let mut ready: BTreeSet<(&str, TableId)> = BTreeSet::new();
        for (i, &deg) in in_degree.iter().enumerate() {
            if deg == 0 {
                ready.insert(self.sort_key(TableId(i as u32)));
            }
        }

        let mut order = Vec::with_capacity(n);
        while let Some((_, table_id)) = ready.pop_first() {
            order.push(table_id);

            for &child_id in &self.children[table_id.0 as usize] {
                if self.is_cyclic_edge(child_id, table_id) {
                    continue;
                }
                in_degree[child_id.0 as usize] -= 1;
                if in_degree[child_id.0 as usize] == 0 {
                    ready.insert(self.sort_key(child_id));
                }
            }
        }

        let cyclic_tables = (0..n)
            .filter(|&i| self.component_cyclic[self.component[i]])
            .map(|i| TableId(i as u32))
            .collect();

        TopoSortResult {
            order,
            cyclic_tables,
        }
    }

    fn sort_key(&self, id: TableId) -> (&'a str, TableId) {
        (
            self.schema.table(id).map(|t| t.name.as_str()).unwrap_or(""),
            id,
        )
    }

    /// Compute the create plan for the given constraint mode.
    pub fn plan(&self, mode: ConstraintMode) -> CreatePlan {
        let sorted = self.topo_sort();
        let mut deferred = Vec::new();

        for &table_id in &sorted.order {
            let Some(table) = self.schema.table(table_id) else {
                continue;
            };
            for (index, fk) in table.foreign_keys.iter().enumerate() {
                if mode == ConstraintMode::Deferred || self.is_cyclic_fk(table, fk) {
                    deferred.push(FkRef {
                        table: table_id,
                        index,
                    });
                }
            }
        }

        CreatePlan {
            order: sorted.order,
            deferred,
            cyclic_tables: sorted.cyclic_tables,
        }
    }
}

/// Two-phase statement order for one schema.
///
/// Phase one creates every table in `order`; phase two attaches the
/// `deferred` foreign keys. Dropping runs both phases backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    /// Table creation order
    pub order: Vec<TableId>,
    /// Foreign keys attached after all tables exist, in attachment order
    pub deferred: Vec<FkRef>,
    /// Tables on an FK cycle
    pub cyclic_tables: Vec<TableId>,
}

impl CreatePlan {
    /// Whether the FK at `index` of `table` is attached in phase two
    pub fn is_deferred(&self, table: TableId, index: usize) -> bool {
        self.deferred.contains(&FkRef { table, index })
    }

    /// Tables in drop order (reverse creation order)
    pub fn drop_order(&self) -> impl Iterator<Item = TableId> + '_ {
        self.order.iter().rev().copied()
    }

    /// Deferred constraints in drop order
    pub fn drop_constraints(&self) -> impl Iterator<Item = FkRef> + '_ {
        self.deferred.iter().rev().copied()
    }
}

/// Order tables for creation.
pub fn plan(schema: &Schema, mode: ConstraintMode) -> CreatePlan {
    SchemaGraph::from_schema(schema).plan(mode)
}

/// Tarjan's strongly connected components, iterative.
///
/// Returns the component index of every node and the component count.
fn strongly_connected(edges: &[Vec<TableId>]) -> (Vec<usize>, usize) {
    const UNVISITED: usize = usize::MAX;
    let n = edges.len();
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut component = vec![UNVISITED; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0;
    let mut count = 0;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        // (node, next edge to visit)
        let mut call: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = call.last_mut() {
            let v = frame.0;
            if let Some(&w) = edges[v].get(frame.1) {
                frame.1 += 1;
                let w = w.0 as usize;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    low[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if low[v] == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component[w] = count;
                    if w == v {
                        break;
                    }
                }
                count += 1;
            }
        }
    }

    (component, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityDefinition, FieldDefinition, RelationKind};
    use crate::schema::build_schema;

    fn entity(name: &str, refs: &[&str]) -> EntityDefinition {
        let mut e = EntityDefinition::new(name).with_id(FieldDefinition::basic("id", "long"));
        for target in refs {
            e = e.with_field(FieldDefinition::relation(
                target.to_lowercase(),
                RelationKind::ManyToOne,
                *target,
            ));
        }
        e
    }

    fn names(schema: &Schema, ids: &[TableId]) -> Vec<String> {
        ids.iter()
            .map(|id| schema.table(*id).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_topo_sort_parents_first_with_name_ties() {
        let schema = build_schema(&[
            entity("Order", &["Customer", "Address"]),
            entity("Customer", &["Address"]),
            entity("Address", &[]),
            entity("Zone", &[]),
            entity("Audit", &[]),
        ])
        .unwrap();
        let graph = SchemaGraph::from_schema(&schema);
        let result = graph.topo_sort();
        assert_eq!(
            names(&schema, &result.order),
            vec!["Address", "Audit", "Customer", "Order", "Zone"]
        );
        assert!(result.cyclic_tables.is_empty());
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let schema = build_schema(&[entity("Employee", &["Employee"])]).unwrap();
        let graph = SchemaGraph::from_schema(&schema);
        let id = schema.get_table_id("Employee").unwrap();
        assert!(graph.has_self_reference(id));
        assert!(graph.is_cyclic_edge(id, id));

        let plan = graph.plan(ConstraintMode::Inline);
        assert_eq!(plan.order, vec![id]);
        assert_eq!(plan.deferred, vec![FkRef { table: id, index: 0 }]);
        assert_eq!(plan.cyclic_tables, vec![id]);
    }

    #[test]
    fn test_mutual_cycle_defers_only_cycle_edges() {
        let schema = build_schema(&[
            entity("Department", &["Employee"]),
            entity("Employee", &["Department"]),
            entity("Badge", &["Employee"]),
        ])
        .unwrap();
        let plan = plan(&schema, ConstraintMode::Inline);

        assert_eq!(
            names(&schema, &plan.order),
            vec!["Department", "Employee", "Badge"]
        );
        let deferred: Vec<_> = plan
            .deferred
            .iter()
            .map(|r| schema.table(r.table).unwrap().name.as_str())
            .collect();
        assert_eq!(deferred, vec!["Department", "Employee"]);

        let badge = schema.get_table_id("Badge").unwrap();
        assert!(!plan.is_deferred(badge, 0));
    }

    #[test]
    fn test_deferred_mode_defers_everything() {
        let schema = build_schema(&[entity("Author", &[]), entity("Book", &["Author"])]).unwrap();
        let plan = plan(&schema, ConstraintMode::Deferred);
        assert_eq!(names(&schema, &plan.order), vec!["Author", "Book"]);
        assert_eq!(plan.deferred.len(), 1);
        assert!(plan.cyclic_tables.is_empty());
    }

    #[test]
    fn test_drop_order_reverses_create_order() {
        let schema = build_schema(&[
            entity("A", &["B"]),
            entity("B", &["A"]),
            entity("C", &["A"]),
        ])
        .unwrap();
        let plan = plan(&schema, ConstraintMode::Inline);
        let drop: Vec<_> = plan.drop_order().collect();
        let mut create = plan.order.clone();
        create.reverse();
        assert_eq!(drop, create);

        let constraints: Vec<_> = plan.drop_constraints().collect();
        let mut deferred = plan.deferred.clone();
        deferred.reverse();
        assert_eq!(constraints, deferred);
    }

    #[test]
    fn test_constraint_mode_parse() {
        assert_eq!(
            "Deferred".parse::<ConstraintMode>().unwrap(),
            ConstraintMode::Deferred
        );
        assert_eq!(ConstraintMode::default(), ConstraintMode::Inline);
        assert!("sometimes".parse::<ConstraintMode>().is_err());
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let mut entities = vec![entity("T0000", &[])];
        for i in 1..5000 {
            let parent = format!("T{:04}", i - 1);
            entities.push(entity(&format!("T{:04}", i), &[parent.as_str()]));
        }
        let schema = build_schema(&entities).unwrap();
        let plan = plan(&schema, ConstraintMode::Inline);
        assert_eq!(plan.order.len(), 5000);
        assert!(plan.deferred.is_empty());
    }
}
