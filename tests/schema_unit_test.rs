//! Unit tests for schema construction and statement ordering through the public API.

use ddl_export::metadata::{EntityDefinition, FieldDefinition, IndexDefinition, RelationKind};
use ddl_export::schema::{build_schema, plan, ConstraintMode, LogicalType, SchemaGraph};
use ddl_export::MappingError;

fn id_entity(name: &str) -> EntityDefinition {
    EntityDefinition::new(name).with_id(FieldDefinition::basic("id", "long"))
}

#[test]
fn test_reference_to_composite_key_expands_columns() {
    let entities = vec![
        EntityDefinition::new("OrderLine")
            .with_id(FieldDefinition::basic("order_no", "int"))
            .with_id(FieldDefinition::basic("line_no", "int")),
        id_entity("Shipment").with_field(FieldDefinition::relation(
            "line",
            RelationKind::ManyToOne,
            "OrderLine",
        )),
    ];
    let schema = build_schema(&entities).unwrap();

    let shipment = schema.get_table("Shipment").unwrap();
    let names: Vec<&str> = shipment.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "line_order_no", "line_line_no"]);

    let fk = &shipment.foreign_keys[0];
    assert_eq!(fk.columns, vec!["line_order_no", "line_line_no"]);
    assert_eq!(fk.referenced_columns, vec!["order_no", "line_no"]);
    assert_eq!(shipment.get_column("line_line_no").unwrap().col_type, LogicalType::Integer);
}

#[test]
fn test_join_column_rejected_for_composite_key() {
    let entities = vec![
        EntityDefinition::new("OrderLine")
            .with_id(FieldDefinition::basic("order_no", "int"))
            .with_id(FieldDefinition::basic("line_no", "int")),
        id_entity("Shipment").with_field(
            FieldDefinition::relation("line", RelationKind::ManyToOne, "OrderLine")
                .join_column("line_ref"),
        ),
    ];
    let err = build_schema(&entities).unwrap_err();
    assert!(matches!(err, MappingError::JoinColumnOnCompositeKey { .. }));
}

#[test]
fn test_join_table_override_and_self_relationship() {
    let entities = vec![id_entity("Person").with_field(
        FieldDefinition::relation("friends", RelationKind::ManyToMany, "Person")
            .join_table("Friendship"),
    )];
    let schema = build_schema(&entities).unwrap();

    let join = schema.get_table("friendship").unwrap();
    assert_eq!(join.name, "Friendship");
    let names: Vec<&str> = join.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Person_id", "friends_id"]);
    assert_eq!(join.primary_key.len(), 2);
    assert!(join.columns.iter().all(|c| !c.is_nullable));
}

#[test]
fn test_constraint_columns_are_validated() {
    let entities = vec![id_entity("Book").with_index(IndexDefinition::on(["isbn"]))];
    let err = build_schema(&entities).unwrap_err();
    match err {
        MappingError::UnknownConstraintColumn { table, column } => {
            assert_eq!(table, "Book");
            assert_eq!(column, "isbn");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_plan_orders_diamond() {
    let entities = vec![
        id_entity("D")
            .with_field(FieldDefinition::relation("b", RelationKind::ManyToOne, "B"))
            .with_field(FieldDefinition::relation("c", RelationKind::ManyToOne, "C")),
        id_entity("C").with_field(FieldDefinition::relation("a", RelationKind::ManyToOne, "A")),
        id_entity("B").with_field(FieldDefinition::relation("a", RelationKind::ManyToOne, "A")),
        id_entity("A"),
    ];
    let schema = build_schema(&entities).unwrap();
    let create = plan(&schema, ConstraintMode::Inline);

    let names: Vec<&str> = create
        .order
        .iter()
        .map(|id| schema.table(*id).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert!(create.deferred.is_empty());

    let dropped: Vec<&str> = create
        .drop_order()
        .map(|id| schema.table(id).unwrap().name.as_str())
        .collect();
    assert_eq!(dropped, vec!["D", "C", "B", "A"]);
}

#[test]
fn test_cycle_members_reported() {
    let entities = vec![
        id_entity("A").with_field(FieldDefinition::relation("b", RelationKind::ManyToOne, "B")),
        id_entity("B").with_field(FieldDefinition::relation("a", RelationKind::ManyToOne, "A")),
        id_entity("C").with_field(FieldDefinition::relation("a", RelationKind::ManyToOne, "A")),
    ];
    let schema = build_schema(&entities).unwrap();
    let graph = SchemaGraph::from_schema(&schema);
    let sorted = graph.topo_sort();

    let a = schema.get_table_id("A").unwrap();
    let b = schema.get_table_id("B").unwrap();
    let c = schema.get_table_id("C").unwrap();
    assert_eq!(sorted.order, vec![a, b, c]);
    assert_eq!(sorted.cyclic_tables, vec![a, b]);

    let create = graph.plan(ConstraintMode::Inline);
    assert_eq!(create.deferred.len(), 2);
    assert!(!create.is_deferred(c, 0));
}
