use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tweet_sentiment::models::{Batch, SearchRecord, TextField};
use tweet_sentiment::nlp::SentimentScorer;

const TWEETS: [&str; 4] = [
    "So happy with this new phone @shop https://t.co/abc123 !!!",
    "The food was good but the service was TERRIBLE",
    "not good at all, kind of disappointing @helpdesk",
    "The sky is blue",
];

fn records(count: usize) -> Batch<SearchRecord> {
    (0..count)
        .map(|i| SearchRecord {
            id: i as i64,
            created_at: chrono::Utc::now(),
            language: "en".to_string(),
            is_retweet: false,
            author_screen_name: format!("user{i}"),
            author_followers_count: 0,
            author_location: String::new(),
            author_time_zone: None,
            favorite_count: 0,
            text: TWEETS[i % TWEETS.len()].to_string(),
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let scorer = SentimentScorer::new().expect("builtin lexicon");
    c.bench_function("score_tweet", |b| {
        b.iter(|| {
            for text in TWEETS {
                black_box(scorer.score(black_box(text)));
            }
        });
    });
}

fn bench_annotate(c: &mut Criterion) {
    let scorer = SentimentScorer::new().expect("builtin lexicon");
    let batch = records(400);
    c.bench_function("annotate_400", |b| {
        b.iter(|| black_box(scorer.annotate(black_box(&batch), TextField::TweetText)));
    });
}

criterion_group!(benches, bench_score, bench_annotate);
criterion_main!(benches);
