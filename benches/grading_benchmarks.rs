use criterion::{Criterion, black_box, criterion_group, criterion_main};

use readingroom::content::catalog::Catalog;
use readingroom::engine::annotation::{AnnotationSet, RegionId, TextPoint, TextSelection};
use readingroom::engine::grading::{band_score, grade, normalize_text};
use readingroom::session::answers::AnswerStore;

fn bench_grade(c: &mut Criterion) {
    let catalog = Catalog::bundled().expect("bundled catalog");
    let test = catalog
        .test("academic", "urban-beekeeping")
        .expect("bundled test")
        .clone();
    let mut answers = AnswerStore::for_test(&test);
    for (i, (_, item)) in test.items().enumerate() {
        // Every third response left blank, the rest in mixed case
        if i % 3 == 2 {
            continue;
        }
        if let Some(answer) = &item.answer {
            answers.set(item.number, format!("  {} ", answer.to_lowercase()));
        }
    }

    c.bench_function("grade (10 questions)", |b| {
        b.iter(|| grade(black_box(&test), black_box(&answers)))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let text = "  Ｆｕｌｌ‐width   ROOFTOP\tapiaries  and\u{00a0}winter   stores ";

    c.bench_function("normalize_text (mixed width)", |b| {
        b.iter(|| normalize_text(black_box(text)))
    });
}

fn bench_band(c: &mut Criterion) {
    c.bench_function("band_score (0..=40 of 40)", |b| {
        b.iter(|| {
            (0..=40usize)
                .map(|correct| band_score(black_box(correct), 40) as u32)
                .sum::<u32>()
        })
    });
}

fn bench_highlights(c: &mut Criterion) {
    let point = |offset| TextPoint {
        region: RegionId::Passage,
        offset,
    };

    c.bench_function("wrap 200 highlights then mask", |b| {
        b.iter(|| {
            let mut set = AnnotationSet::default();
            for i in 0..200usize {
                let selection = TextSelection {
                    anchor: point(i * 10),
                    focus: point(i * 10 + 5),
                };
                let _ = set.wrap(&selection, 2000);
            }
            set.mask(RegionId::Passage, black_box(2000))
        })
    });
}

criterion_group!(benches, bench_grade, bench_normalize, bench_band, bench_highlights);
criterion_main!(benches);
