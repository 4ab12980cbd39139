use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use tributary::Store;

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| {
            let store: Store<i32> = Store::new(black_box(42));
            store
        });
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store: Store<i32> = Store::new(42);

    c.bench_function("store_read", |b| {
        b.iter(|| {
            black_box(store.get());
        });
    });
}

fn store_write_benchmark(c: &mut Criterion) {
    let store: Store<i32> = Store::new(0);
    let setter = store.setter();

    c.bench_function("store_write", |b| {
        let mut i = 0;
        b.iter(|| {
            setter.set(black_box(i));
            i += 1;
        });
    });
}

fn notify_benchmark(c: &mut Criterion) {
    let store: Store<i32> = Store::new(0);
    for _ in 0..10 {
        store.subscribe(|state, _| {
            black_box(*state);
        });
    }
    let setter = store.setter();

    c.bench_function("notify_ten_listeners", |b| {
        let mut i = 0;
        b.iter(|| {
            setter.set(black_box(i));
            i += 1;
        });
    });
}

fn detector_gate_benchmark(c: &mut Criterion) {
    let store: Store<i32> = Store::new(0);
    store.detect(|state: &i32| vec![*state]).subscribe(|state, _| {
        black_box(*state);
    });
    let setter = store.setter();

    c.bench_function("detector_gated_write", |b| {
        b.iter(|| {
            // Same value every time: the gate swallows the notification.
            setter.set(black_box(0));
        });
    });
}

fn from_propagation_benchmark(c: &mut Criterion) {
    let parent: Store<i32> = Store::new(0);
    let child = Store::new(0).from(&parent).unwrap().map(|p, _| p + 1);
    let setter = parent.setter();

    c.bench_function("from_propagation", |b| {
        let mut i = 0;
        b.iter(|| {
            setter.set(black_box(i));
            i += 1;
        });
    });
    black_box(child);
}

fn to_propagation_benchmark(c: &mut Criterion) {
    let parent: Store<i32> = Store::new(0);
    let child = Store::new(0).to(&parent).unwrap().map(|c, _| *c);
    let setter = child.setter();

    c.bench_function("to_propagation", |b| {
        let mut i = 0;
        b.iter(|| {
            setter.set(black_box(i));
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    store_creation_benchmark,
    store_read_benchmark,
    store_write_benchmark,
    notify_benchmark,
    detector_gate_benchmark,
    from_propagation_benchmark,
    to_propagation_benchmark
);
criterion_main!(benches);
