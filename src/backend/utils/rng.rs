// src/backend/utils/rng.rs
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    // Thread-local RNG used for id generation. Seeded from raw_rand during
    // canister init / post_upgrade.
    static ID_RNG: RefCell<Option<StdRng>> = RefCell::new(None);
}

/// Seeds the thread-local RNG. Called from canister init and post_upgrade
/// with entropy obtained from `raw_rand`.
pub fn seed_rng(seed: [u8; 32]) {
    ID_RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::from_seed(seed));
    });
}

/// Borrows the RNG, seeding it from wall-clock entropy if nothing better has
/// happened yet (native test runs never go through canister init).
pub fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut StdRng) -> R,
{
    ID_RNG.with(|rng| {
        let mut borrowed = rng.borrow_mut();
        let instance = borrowed.get_or_insert_with(|| {
            let mut seed = [0u8; 32];
            let nanos = crate::utils::time::now_ns();
            seed[..8].copy_from_slice(&nanos.to_le_bytes());
            StdRng::from_seed(seed)
        });
        f(instance)
    })
}
