//! Model-checks `PageAllocator`'s single-lock discipline under `loom`.
//!
//! Only runs under `RUSTFLAGS="--cfg loom" cargo test --release --test
//! loom_allocator` — `loom`'s exhaustive interleaving search is far too
//! slow for a normal `cargo test` run, so this whole file is compiled out
//! otherwise.

#![cfg(loom)]

use kv_paging_sim::{Config, PageAllocator};
use std::sync::Arc;

fn tiny_config() -> Config {
    Config {
        tokens_per_page: 1,
        arena_bytes: 2 * Config::default().page_bytes(),
        ..Config::default()
    }
}

#[test]
fn concurrent_alloc_dec_ref_never_oversubscribes_the_arena() {
    loom::model(|| {
        let allocator = Arc::new(PageAllocator::create(&tiny_config()).unwrap());
        assert_eq!(allocator.num_pages(), 2);

        let a = Arc::clone(&allocator);
        let t1 = loom::thread::spawn(move || {
            let page = a.alloc();
            a.dec_ref(page);
        });

        let b = Arc::clone(&allocator);
        let t2 = loom::thread::spawn(move || {
            let page = b.alloc();
            b.dec_ref(page);
        });

        t1.join().unwrap();
        t2.join().unwrap();

        assert_eq!(allocator.pages_in_use(), 0);
    });
}

#[test]
fn concurrent_inc_ref_keeps_a_shared_page_alive_until_both_release_it() {
    loom::model(|| {
        let allocator = Arc::new(PageAllocator::create(&tiny_config()).unwrap());
        let page = allocator.alloc();
        allocator.inc_ref(page);

        let a = Arc::clone(&allocator);
        let t1 = loom::thread::spawn(move || {
            a.dec_ref(page);
        });

        let b = Arc::clone(&allocator);
        let t2 = loom::thread::spawn(move || {
            b.dec_ref(page);
        });

        t1.join().unwrap();
        t2.join().unwrap();

        assert_eq!(allocator.pages_in_use(), 0);
    });
}
