// marksync state managers
// Managers handle live in-memory state: currently the bookmark sync list.

pub mod sync_list;
