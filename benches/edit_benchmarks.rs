use criterion::{black_box, criterion_group, criterion_main, Criterion};
use yaml_config_edit::{ConfigDocument, ConfigValue, Key};

const STACK_CONFIG: &str = r#"# Stack settings for production
config:
  aws:region: us-west-2 # primary region
  app:name: storefront
  app:replicas: 3
  app:database:
    host: db.internal
    port: 5432
    pool:
      min: 2
      max: 20
  app:servers:
    - host: web-1
      port: 8080
    - host: web-2
      port: 8080
  app:tags: [frontend, public]
  app:apiKey:
    secure: AAABAHgGT0k5gTV8tGbQGAbv2cvhL4kU
"#;

fn bench_parse_config(c: &mut Criterion) {
    c.bench_function("parse_config", |b| {
        b.iter(|| {
            let doc = ConfigDocument::parse(black_box(STACK_CONFIG)).unwrap();
            black_box(doc.to_string())
        })
    });
}

fn bench_set_path(c: &mut Criterion) {
    let doc = ConfigDocument::parse(STACK_CONFIG).unwrap();
    let existing: Key = "app:database.pool.max".parse().unwrap();
    let created: Key = "app:servers[2].host".parse().unwrap();

    c.bench_function("set_existing_path", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            doc.set("config", black_box(&existing), &ConfigValue::new("50"), true)
                .unwrap();
            black_box(doc.marshal())
        })
    });

    c.bench_function("set_new_path", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            doc.set("config", black_box(&created), &ConfigValue::new("web-3"), true)
                .unwrap();
            black_box(doc.marshal())
        })
    });
}

fn bench_remove_round_trip(c: &mut Criterion) {
    let keys: Vec<Key> = ["app:database.pool.min", "app:tags[0]", "app:apiKey"]
        .iter()
        .map(|key| key.parse().unwrap())
        .collect();

    c.bench_function("remove_round_trip", |b| {
        b.iter(|| {
            let mut doc = ConfigDocument::parse(black_box(STACK_CONFIG)).unwrap();
            for key in &keys {
                doc.remove("config", key, true).unwrap();
            }
            let written = doc.marshal();
            black_box(ConfigDocument::load(Some(written.as_slice())).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_parse_config,
    bench_set_path,
    bench_remove_round_trip
);
criterion_main!(benches);
