use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_review::config::EditorConfig;
use table_review::format::validate_all_rows_format;
use table_review::summary::{detect_summary_rows_locally, mark_summary_row};
use table_review::table::Table;

fn generate_statement(agents: usize, policies_per_agent: usize) -> Table {
    let header = ["Agent", "Policy", "Premium", "Rate", "Commission", "Paid"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut rows = Vec::with_capacity(agents * (policies_per_agent + 1) + 1);
    for agent in 0..agents {
        for policy in 0..policies_per_agent {
            let day = (policy % 28) + 1;
            rows.push(vec![
                format!("Agent {agent}"),
                format!("P-{agent}-{policy}"),
                format!("${},{:03}.00", 1 + policy % 9, (agent * 37) % 1000),
                format!("{}%", 3 + policy % 4),
                format!("${}.50", 40 + policy),
                format!("01/{day:02}/2024"),
            ]);
        }
        rows.push(vec![
            format!("Subtotal: Agent {agent}"),
            String::new(),
            "$12,000.00".to_string(),
            String::new(),
            "$480.00".to_string(),
            String::new(),
        ]);
    }
    rows.push(vec![
        "Grand Total".to_string(),
        String::new(),
        "$1,200,000.00".to_string(),
        String::new(),
        "$48,000.00".to_string(),
        String::new(),
    ]);
    Table::new(header, rows)
}

fn bench_summary_detection(c: &mut Criterion) {
    let table = generate_statement(200, 25);
    let config = EditorConfig::default();
    let subtotal_idx = 25;

    let mut group = c.benchmark_group("summary_rows");

    group.bench_function("detect_locally", |b| {
        b.iter(|| detect_summary_rows_locally(&table, &config));
    });

    group.bench_function("mark_with_cascade", |b| {
        b.iter_batched(
            || table.clone(),
            |mut table| {
                mark_summary_row(&mut table, subtotal_idx, config.similarity_threshold)
                    .expect("mark subtotal");
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("validate_against_reference", |b| {
        b.iter(|| validate_all_rows_format(&table, 0));
    });

    group.finish();
}

criterion_group!(benches, bench_summary_detection);
criterion_main!(benches);
