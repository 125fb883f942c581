//! Heap use of local sorts, measured with a counting global allocator.
//!
//! This lives in its own test binary so that no other test allocates while a
//! measurement is running.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use segsort_lib::keys::MetaKey;
use segsort_lib::metadata::TraceMetadata;
use segsort_lib::schema::{ExtentMode, Schema};

struct CountingAlloc;

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn by_inline(store: &TraceMetadata, a: usize, b: usize) -> bool {
    store.get_integer(a, MetaKey::Inline).unwrap() < store.get_integer(b, MetaKey::Inline).unwrap()
}

#[test]
fn test_sorting_a_short_range_allocates_only_for_that_range() {
    let n = 100_000;
    let mut schema = Schema::from_keys(&[MetaKey::Inline, MetaKey::Gtn], ExtentMode::Tight).unwrap();
    schema.add_copy();
    let mut store = TraceMetadata::new(schema.into_shared(), n);
    for i in 0..n {
        store.set_integer(i, MetaKey::Inline, (n - i) as i64).unwrap();
    }
    assert!(store.memory_usage() > 20_000_000);

    let before = ALLOCATED.load(Ordering::Relaxed);
    store.sort_range_by(n - 2..n, &by_inline);
    let allocated = ALLOCATED.load(Ordering::Relaxed) - before;

    assert_eq!(store.get_integer(n - 2, MetaKey::Inline).unwrap(), 1);
    assert_eq!(store.get_integer(n - 1, MetaKey::Inline).unwrap(), 2);
    assert!(allocated < 64 * 1024, "sorting two records allocated {allocated} bytes");
}
