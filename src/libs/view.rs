use super::formatter::format_elapsed;
use super::task::Task;
use super::timer::current_elapsed_time;
use chrono::{DateTime, Utc};
use prettytable::{row, Table};

pub struct View {}

impl View {
    /// Prints tasks with their live elapsed time as of `now`.
    pub fn tasks(tasks: &[Task], now: DateTime<Utc>) {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME", "STATUS", "TIMER", "ELAPSED", "OWNER"]);
        for task in tasks {
            table.add_row(row![
                task.id,
                task.name,
                task.status,
                task.timer.timer_status,
                format_elapsed(current_elapsed_time(&task.timer, now)),
                task.owner_id.as_deref().unwrap_or("-")
            ]);
        }
        table.printstd();
    }
}
