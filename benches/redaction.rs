use criterion::{black_box, criterion_group, criterion_main, Criterion};
use profanity_capture::{tokenize, Dictionary, ProfanityAnalyzer, Redactor};
use std::time::Duration;

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

fn sample_markup() -> String {
    let paragraph = "<p>This is a damn long paragraph with the occasional hell \
                     of a word, repeated to look like real page markup.</p>\n";
    paragraph.repeat(200)
}

fn sample_dictionary() -> Dictionary {
    Dictionary::from_contents("damn\nhell\ncrap\nbloody\nblasted\n")
}

fn benchmark_redactor_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("redactor");
    configure_fast_group(&mut group);

    let dictionary = sample_dictionary();
    group.bench_function("compilation", |b| {
        b.iter(|| {
            let redactor = Redactor::new(&dictionary);
            black_box(redactor);
        });
    });

    group.finish();
}

fn benchmark_redaction_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("redaction");
    configure_fast_group(&mut group);

    let dictionary = sample_dictionary();
    let redactor = Redactor::new(&dictionary);
    let markup = sample_markup();

    group.bench_function("markup_pass", |b| {
        b.iter(|| {
            let redacted = redactor.redact(black_box(&markup));
            black_box(redacted);
        });
    });

    group.finish();
}

fn benchmark_tokenization(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");
    configure_fast_group(&mut group);

    let text = "This is DAMN annoying, again and again. ".repeat(500);

    group.bench_function("tokenize", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&text));
            black_box(tokens);
        });
    });

    let analyzer = ProfanityAnalyzer::new(&sample_dictionary());
    group.bench_function("analyze", |b| {
        b.iter(|| {
            let stats = analyzer.analyze(black_box(&text));
            black_box(stats);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_redactor_compilation,
    benchmark_redaction_pass,
    benchmark_tokenization
);
criterion_main!(benches);
