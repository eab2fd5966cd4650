use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memceil_core::policy::MemoryPolicy;
use memceil_mem::{BoundedAllocator, HostAllocator, TracedPolicy};

fn bench_alloc_free(c: &mut Criterion) {
    let alloc = BoundedAllocator::new(30_000);
    c.bench_function("bounded_alloc_free_64", |b| {
        b.iter(|| unsafe {
            let block = alloc
                .allocate_or_resize(None, 0, black_box(64))
                .unwrap()
                .unwrap();
            alloc.allocate_or_resize(Some(block), 64, 0).unwrap();
        })
    });

    let traced = TracedPolicy::new(BoundedAllocator::new(30_000));
    c.bench_function("traced_alloc_free_64", |b| {
        b.iter(|| unsafe {
            let block = traced
                .allocate_or_resize(None, 0, black_box(64))
                .unwrap()
                .unwrap();
            traced.allocate_or_resize(Some(block), 64, 0).unwrap();
        })
    });
}

fn bench_grow_chain(c: &mut Criterion) {
    let alloc = BoundedAllocator::new(30_000);
    let host = HostAllocator::new(&alloc);
    c.bench_function("raw_grow_16_to_16k", |b| {
        b.iter(|| unsafe {
            let mut p = host.call(std::ptr::null_mut(), 0, 16);
            let mut size = 16;
            while size < 16 * 1024 {
                p = host.call(p, size, size * 2);
                size *= 2;
            }
            host.call(p, size, 0);
        })
    });
}

fn bench_denied(c: &mut Criterion) {
    let alloc = BoundedAllocator::new(1024);
    c.bench_function("bounded_denied", |b| {
        b.iter(|| unsafe {
            let _ = black_box(alloc.allocate_or_resize(None, 0, black_box(4096)));
        })
    });
}

criterion_group!(allocator, bench_alloc_free, bench_grow_chain, bench_denied);
criterion_main!(allocator);
