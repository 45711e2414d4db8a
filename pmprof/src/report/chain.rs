//! Chain tables.
//!
//! ```text
//! Profile  Chain   Link   Timestamp                 Free Memory   Memory Diff  (MEGABYTES)   Elapsed Diff
//! -------  -----   ----   ---------                 -----------   -----------  -----------   ------------
//! orders   insert  begin  03/04/2021 01:05:09:7         1048576           ...  (...)                  ...
//! orders   insert  end    03/04/2021 01:05:09:57         524288       -524288  (-0.5)                  50
//!                                                                 -----------                ------------
//!                                                                     -524288  (-0.5)                  50
//! ```
//!
//! The first link of a chain has no predecessor and shows placeholders.

use super::field::{build_field, column_width, Justify, TextTable};
use super::{Renderer, DISABLED_MARKER, MIN_PROFILE_COL};
use crate::chain::{ChainSnapshot, Link};

const MIN_CHAIN_COL: usize = 5;
const MIN_LINK_COL: usize = 4;
const TIMESTAMP_COL: usize = 25;
const FREE_MEMORY_COL: usize = 12;
const MEMORY_DIFF_COL: usize = 12;
const MEGABYTE_COL: usize = 11;
const ELAPSED_DIFF_COL: usize = 13;

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Name column widths shared by every row of one report.
struct Columns {
    profile: usize,
    chain: usize,
    link: usize,
}

impl Columns {
    fn measure(chains: &[ChainSnapshot]) -> Self {
        Self {
            profile: column_width(chains.iter().map(|c| c.profile.as_str()), MIN_PROFILE_COL),
            chain: column_width(chains.iter().map(|c| c.name.as_str()), MIN_CHAIN_COL),
            link: column_width(
                chains.iter().flat_map(|c| c.links.iter().map(Link::name)),
                MIN_LINK_COL,
            ),
        }
    }

    /// Width of everything left of the memory difference column.
    fn before_diff(&self) -> usize {
        4 * super::GAP_WIDTH + self.profile + self.chain + self.link + TIMESTAMP_COL + FREE_MEMORY_COL
    }
}

/// `(<megabytes>)`, with the number cut to fit inside the parentheses.
///
/// The cut is plain truncation, so an exponent (`-9.5367431640625E-4`) can
/// fall off the end and leave only the leading mantissa digits.
fn megabytes(bytes: i64) -> String {
    let value = decimal_text(bytes as f64 / BYTES_PER_MEGABYTE);
    format!(
        "({})",
        build_field(MEGABYTE_COL - 2, Justify::Left, &value).trim()
    )
}

/// Shortest round-trip text of `value`, in plain notation for magnitudes in
/// `[1e-3, 1e7)` and as `<mantissa>E<exponent>` outside it. The mantissa
/// always carries a fractional digit (`1.0`, `5.0E-4`).
fn decimal_text(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => {
            format!("{}E{}", mantissa, exponent)
        }
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => scientific,
    }
}

impl Renderer<'_> {
    /// Chain table, one row per link.
    pub fn chains(&self, mut chains: Vec<ChainSnapshot>) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        if chains.is_empty() {
            return String::new();
        }
        chains.sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));

        let columns = Columns::measure(&chains);
        let mut table = TextTable::new();
        self.chain_header(&mut table, &columns);
        for chain in &chains {
            self.chain_rows(&mut table, &columns, chain);
        }
        table.finish()
    }

    fn chain_header(&self, table: &mut TextTable, columns: &Columns) {
        table
            .left(columns.profile, "Profile")
            .gap()
            .left(columns.chain, "Chain")
            .gap()
            .left(columns.link, "Link")
            .gap()
            .left(TIMESTAMP_COL, "Timestamp")
            .right(FREE_MEMORY_COL, "Free Memory")
            .gap()
            .right(MEMORY_DIFF_COL, "Memory Diff");
        if self.options.chain_megabyte_column {
            table.gap().left(MEGABYTE_COL, "(MEGABYTES)");
        }
        table.gap().right(ELAPSED_DIFF_COL, "Elapsed Diff");

        table
            .newline()
            .left(columns.profile, "-------")
            .gap()
            .left(columns.chain, "-----")
            .gap()
            .left(columns.link, "----")
            .gap()
            .left(TIMESTAMP_COL, "---------")
            .right(FREE_MEMORY_COL, "-----------")
            .gap()
            .right(MEMORY_DIFF_COL, "-----------");
        if self.options.chain_megabyte_column {
            table.gap().left(MEGABYTE_COL, "-----------");
        }
        table.gap().right(ELAPSED_DIFF_COL, "------------");
    }

    fn chain_rows(&self, table: &mut TextTable, columns: &Columns, chain: &ChainSnapshot) {
        let mut previous: Option<&Link> = None;
        for link in &chain.links {
            let (memory_diff, megabyte_diff, elapsed_diff) = match previous {
                Some(previous) => {
                    let memory = link.memory_diff(previous);
                    (
                        memory.to_string(),
                        megabytes(memory),
                        link.elapsed_diff(previous).to_string(),
                    )
                }
                None => ("...".to_string(), "(...)".to_string(), "...".to_string()),
            };

            table
                .newline()
                .left(columns.profile, &chain.profile)
                .gap()
                .left(columns.chain, &chain.name)
                .gap()
                .left(columns.link, link.name())
                .gap()
                .left(TIMESTAMP_COL, &self.host.format_timestamp(link.timestamp()))
                .right(FREE_MEMORY_COL, &link.free_memory().to_string())
                .gap()
                .right(MEMORY_DIFF_COL, &memory_diff);
            if self.options.chain_megabyte_column {
                table.gap().left(MEGABYTE_COL, &megabyte_diff);
            }
            table.gap().right(ELAPSED_DIFF_COL, &elapsed_diff);

            previous = Some(link);
        }

        if self.options.chain_totals_row {
            self.chain_totals(table, columns, chain);
        } else if self.options.separate_chains {
            table.newline();
        }
    }

    fn chain_totals(&self, table: &mut TextTable, columns: &Columns, chain: &ChainSnapshot) {
        let memory_total = chain.total_memory_diff();
        let elapsed_total = chain.total_elapsed_diff();

        table
            .newline()
            .blank(columns.before_diff())
            .right(MEMORY_DIFF_COL, "-----------");
        if self.options.chain_megabyte_column {
            table.gap().blank(MEGABYTE_COL);
        }
        table.gap().right(ELAPSED_DIFF_COL, "------------");

        table
            .newline()
            .blank(columns.before_diff())
            .right(MEMORY_DIFF_COL, &memory_total.to_string());
        if self.options.chain_megabyte_column {
            table.gap().left(MEGABYTE_COL, &megabytes(memory_total));
        }
        table
            .gap()
            .right(ELAPSED_DIFF_COL, &elapsed_total.to_string())
            .newline();
    }
}
