use storysync_pipeline::RunSummary;

/// Final counter block, printed after a consolidation run.
pub fn print_summary(summary: &RunSummary) {
    let counts = &summary.handles;
    let total = summary.records_out();
    let available = counts.available();
    let percentage = if total > 0 {
        (available as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!("{}", "=".repeat(70));
    println!(
        "Consolidated {} record(s) into {} session(s) in {} ms",
        total, summary.sessions, summary.time_ms
    );
    if summary.duplicates_dropped > 0 {
        println!("Dropped {} duplicate(s)", summary.duplicates_dropped);
    }
    println!("Generated {} new signed URL(s)", counts.generated);
    if counts.reused > 0 {
        println!("Reused {} existing signed URL(s)", counts.reused);
    }
    println!("Total available: {available}/{total} ({percentage:.1}%)");
    if counts.missing > 0 {
        println!("{} video file(s) not found", counts.missing);
    }
    if counts.errors > 0 {
        println!("{} error(s) occurred", counts.errors);
    }
    if summary.ids_assigned > 0 {
        println!("Assigned {} new sequence id(s)", summary.ids_assigned);
    }
    if summary.cancelled {
        println!("Run was cancelled; output is partial");
    }
}
