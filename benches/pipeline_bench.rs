use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ddl_export::dialect::SqlDialect;
use ddl_export::format::format;
use ddl_export::metadata::{parse_document, EntityDefinition, SourceFormat};
use ddl_export::pipeline::{generate, prepare, ExportConfig};
use ddl_export::schema::{build_schema, ConstraintMode};
use entity_gen::{Generator, Scale};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::TempDir;

fn generate_entities(scale: Scale, cycles: f64) -> Vec<EntityDefinition> {
    let yaml = Generator::new(42, scale)
        .with_cycles(cycles)
        .generate()
        .to_yaml()
        .unwrap();
    parse_document(&yaml, SourceFormat::Yaml, Path::new("bench.yaml"))
        .unwrap()
        .entities
}

fn bench_schema_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_build");

    for scale in [Scale::Small, Scale::Medium, Scale::Large] {
        let entities = generate_entities(scale, 0.02);
        group.throughput(Throughput::Elements(entities.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("build_and_order", entities.len()),
            &entities,
            |b, entities| {
                b.iter(|| {
                    let schema = build_schema(black_box(entities)).unwrap();
                    ddl_export::schema::plan(&schema, ConstraintMode::Inline)
                })
            },
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_create");
    let entities = generate_entities(Scale::Medium, 0.02);
    let config = ExportConfig::default();
    let prepared = prepare(&entities, &config).unwrap();

    for dialect in SqlDialect::ALL {
        group.bench_with_input(
            BenchmarkId::new("create_script", dialect),
            &dialect,
            |b, dialect| {
                b.iter(|| prepared.create_script(dialect.dialect(), ";").unwrap())
            },
        );
    }

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    let sql = "create table Book (id bigint not null, title varchar(255), price decimal(19, 2), \
               author_id bigint, constraint pk_Book primary key (id), \
               constraint fk_Book_author foreign key (author_id) references Author(id))";

    group.throughput(Throughput::Bytes(sql.len() as u64));
    group.bench_function("create_table", |b| b.iter(|| format(black_box(sql))));
    group.finish();
}

fn bench_generate_e2e(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_e2e");
    group.sample_size(20);

    for scale in [Scale::Small, Scale::Medium] {
        let entities = generate_entities(scale, 0.02);
        let temp_dir = TempDir::new().unwrap();
        let config = ExportConfig {
            output_dir: temp_dir.path().join("ddl"),
            dialect: SqlDialect::Postgres,
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("generate", entities.len()),
            &entities,
            |b, entities| {
                b.iter_with_setup(
                    || {
                        if config.output_dir.exists() {
                            fs::remove_dir_all(&config.output_dir).unwrap();
                        }
                    },
                    |_| generate(entities, &config).unwrap(),
                )
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_schema_build,
    bench_render,
    bench_format,
    bench_generate_e2e
);
criterion_main!(benches);
