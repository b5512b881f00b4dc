//! Benchmarks for the routing hot paths: stack push/pop and scope open/close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use markalloc::{
    current_mark, pop_routing, push_routing, scope, BackedMode, BackingMemory, BlobRecord,
    DevicePtr, Mark, RouteError, RuntimeBinding, StreamId, VirtualMemoryManager,
};

struct NullBacking {
    next: AtomicU64,
}

impl BackingMemory for NullBacking {
    fn allocate(&self, _size: usize) -> Result<DevicePtr, RouteError> {
        Ok(DevicePtr(self.next.fetch_add(0x1000, Ordering::Relaxed)))
    }

    fn free(&self, _address: DevicePtr, _size: usize) {}
}

struct NullManager;

impl VirtualMemoryManager for NullManager {
    fn register_blob(&self, _blob: BlobRecord) -> Result<(), RouteError> {
        Ok(())
    }

    fn unregister_blob(&self, _address: DevicePtr) -> bool {
        false
    }

    fn release_with_mark(&self, _mark: &str) -> Result<usize, RouteError> {
        Ok(0)
    }

    fn materialize_with_mark(&self, _mark: &str) -> Result<usize, RouteError> {
        Ok(0)
    }
}

fn bind_null_runtime() {
    let _ = RuntimeBinding::new(
        Arc::new(NullBacking {
            next: AtomicU64::new(0x1000),
        }),
        Arc::new(NullManager),
    )
    .bind();
}

fn bench_stack_push_pop(c: &mut Criterion) {
    bind_null_runtime();
    let mark = Mark::new("bench");

    c.bench_function("push_pop", |b| {
        b.iter(|| {
            push_routing(black_box(mark.clone()), BackedMode::None, StreamId(1));
            black_box(current_mark());
            pop_routing().unwrap();
        });
    });
}

fn bench_scope_open_close(c: &mut Criterion) {
    bind_null_runtime();

    let mut group = c.benchmark_group("scope");

    group.bench_function("open_close", |b| {
        b.iter(|| {
            let guard = scope("bench_scope", BackedMode::None).unwrap();
            black_box(guard.mark());
            guard.close().unwrap();
        });
    });

    group.bench_function("open_alloc8_close", |b| {
        b.iter(|| {
            let guard = scope("bench_alloc", BackedMode::None).unwrap();
            for _ in 0..8 {
                black_box(guard.alloc(4096).unwrap());
            }
            guard.close().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_stack_push_pop, bench_scope_open_close);
criterion_main!(benches);
