pub mod files;
pub mod interchange;
pub mod table;

pub use files::{
    atomic_write, ensure_data_dir, export_file, get_data_dir, init_local_dir, read_file,
    report_file, tasks_file,
};
pub use interchange::{decode_tasks, encode_tasks};
pub use table::{load_table, save_table, TaskTable};
