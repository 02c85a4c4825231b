mod memory_task_repository;
mod pg_pool;
mod pg_task_repository;

pub use memory_task_repository::InMemoryTaskRepository;
pub use pg_pool::create_pool;
pub use pg_task_repository::PgTaskRepository;
