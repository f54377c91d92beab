// src/backend/storage/memory.rs
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::{DefaultMemoryImpl, StableCell};
use std::cell::RefCell;

// Define Memory IDs for stable structures
// Choose non-overlapping IDs
const UPGRADES_MEMORY_ID: MemoryId = MemoryId::new(0);
const REPORTS_MEM_ID: MemoryId = MemoryId::new(1);
const SLIDES_MEM_ID: MemoryId = MemoryId::new(2);
const METRICS_MEM_ID: MemoryId = MemoryId::new(3);
// Reserve IDs 4-19 for future use

// Define memory type alias
pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    // Memory manager
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> = RefCell::new(
        MemoryManager::init(DefaultMemoryImpl::default())
    );

    // Stable cell tracking the upgrade counter
    pub static UPGRADES: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(MEMORY_MANAGER.with(|m| m.borrow().get(UPGRADES_MEMORY_ID)), 0)
            .expect("Failed to initialize upgrades cell")
    );
}

/// Get memory instance for a specific MemoryId.
pub fn get_memory(id: MemoryId) -> Memory {
    MEMORY_MANAGER.with(|m| m.borrow().get(id))
}

pub fn get_reports_memory() -> Memory {
    get_memory(REPORTS_MEM_ID)
}

pub fn get_slides_memory() -> Memory {
    get_memory(SLIDES_MEM_ID)
}

pub fn get_metrics_memory() -> Memory {
    get_memory(METRICS_MEM_ID)
}
