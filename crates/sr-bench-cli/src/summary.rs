//! Console rendering of the summary table.

use sr_bench::SummaryTable;

pub fn print(table: &SummaryTable) {
    println!("{:<15} {:>8} {:>12} {:>10}", "DataSet", "Images", "PSNR", "SSIM");
    println!("{:-<48}", "");

    for row in table.rows() {
        let name = if row.dataset.chars().count() > 15 {
            format!("{}...", row.dataset.chars().take(12).collect::<String>())
        } else {
            row.dataset.clone()
        };
        println!(
            "{:<15} {:>8} {:>12} {:>10}",
            name,
            row.images,
            row.psnr.to_string(),
            row.ssim.to_string()
        );
    }
}
