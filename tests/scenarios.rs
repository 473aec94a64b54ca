//! End-to-end scenarios covering both backends, run against the public
//! crate API exactly as a caller would use it.

use kv_paging_sim::backend::{mono::MonolithicBackend, paged::PagedBackend};
use kv_paging_sim::{Backend, Config, SequenceWork};

fn cfg(tokens_per_page: usize, num_groups: usize, max_context_tokens: usize, arena_pages: usize) -> Config {
    let mut c = Config {
        num_layers: 4,
        num_heads: 8,
        head_dim: 64,
        tokens_per_page,
        num_groups,
        max_context_tokens,
        ..Config::default()
    };
    c.arena_bytes = arena_pages * c.page_bytes();
    c
}

fn work(prompt: usize, gen: usize, shared_tokens: usize, group: Option<usize>) -> SequenceWork {
    SequenceWork {
        prompt_tokens: prompt,
        gen_tokens: gen,
        shared_prompt_tokens: shared_tokens,
        shared_prompt_id: group,
    }
}

fn run_to_completion(backend: &dyn Backend, seq: SequenceWork) -> usize {
    let id = backend.init_sequence(&seq);
    for _ in 0..(seq.prompt_tokens + seq.gen_tokens) {
        backend.append_token(id);
    }
    id
}

#[test]
fn scenario_1_no_sharing_single_sequence() {
    let c = cfg(16, 0, 2048, 64);
    assert_eq!(c.bytes_per_token(), 1024);

    let backend = PagedBackend::create(c).unwrap();
    run_to_completion(&backend, work(32, 32, 0, None));

    let st = backend.stats();
    assert_eq!(st.logical_tokens, 64);
    assert_eq!(backend.pages_in_use(), 4);
    assert_eq!(st.physical_bytes, 65_536);
}

#[test]
fn scenario_2_full_sharing_single_group() {
    let c = cfg(16, 1, 2048, 64);
    let backend = PagedBackend::create(c).unwrap();

    for _ in 0..4 {
        run_to_completion(&backend, work(64, 0, 64, Some(0)));
    }

    let st = backend.stats();
    assert_eq!(st.logical_tokens, 256);
    assert_eq!(backend.pages_in_use(), 4);
    assert_eq!(st.physical_bytes, 4 * backend.page_bytes());
}

#[test]
fn scenario_3_partial_sharing_with_private_tail() {
    let c = cfg(16, 1, 2048, 64);
    let backend = PagedBackend::create(c).unwrap();

    for _ in 0..4 {
        run_to_completion(&backend, work(64, 16, 64, Some(0)));
    }

    let st = backend.stats();
    assert_eq!(st.logical_tokens, 320);
    assert_eq!(backend.pages_in_use(), 8);
}

#[test]
fn scenario_4_paged_strictly_smaller_than_monolithic() {
    let c = cfg(16, 1, 128, 64);

    let mono = MonolithicBackend::create(c).unwrap();
    for _ in 0..4 {
        run_to_completion(&mono, work(64, 0, 64, Some(0)));
    }
    let mono_physical = mono.stats().physical_bytes;
    assert_eq!(mono_physical, 4 * 128 * c.bytes_per_token());

    let paged = PagedBackend::create(c).unwrap();
    for _ in 0..4 {
        run_to_completion(&paged, work(64, 0, 64, Some(0)));
    }
    let paged_physical = paged.stats().physical_bytes;
    assert_eq!(paged_physical, 4 * paged.page_bytes());

    assert!(paged_physical < mono_physical);
}

#[test]
fn scenario_5_finish_releases_but_group_keeps_sharing() {
    let c = cfg(16, 1, 2048, 64);
    let backend = PagedBackend::create(c).unwrap();

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(run_to_completion(&backend, work(64, 0, 64, Some(0))));
    }

    let before = backend.pages_in_use();
    backend.finish_sequence(ids[0]);
    assert_eq!(backend.pages_in_use(), before);
}

#[test]
fn scenario_6_destroy_cleans_up_every_scenario() {
    for seqs in [
        vec![work(32, 32, 0, None)],
        vec![work(64, 0, 64, Some(0)); 4],
        vec![work(64, 16, 64, Some(0)); 4],
    ] {
        let c = cfg(16, 1, 2048, 64);
        let backend = PagedBackend::create(c).unwrap();
        for w in seqs {
            run_to_completion(&backend, w);
        }
        backend.destroy();
        assert_eq!(backend.pages_in_use(), 0);
    }
}
