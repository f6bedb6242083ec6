//! # Tabular display for magstats outputs
//!
//! Borrowing renderers printing a [`MagstatsOutput`] as a **table** through `comfy-table`.
//!
//! ## Overview
//!
//! The display adaptor [`MagstatsDisplay`] borrows the output and renders it when used with
//! Rust formatting (`{}`), without cloning records. Two layouts are available:
//!
//! - **Objects**: `aid | oid | ndet | first MJD | last MJD | RA ±σ["] | DEC ±σ["] | flags`
//! - **Filters**: `aid | fid | ndet | mean | median | σ | first | last | sat. rate | dmdt`
//!
//! Missing values (excluded calculators, groups without qualifying rows) print as `-`,
//! numerically undefined ones as `NaN`.
//!
//! ## Quick examples
//!
//! ```rust
//! use magstats::display::MagstatsDisplayExt;
//! use magstats::{compute_magstats, Detection, LightCurveBatch, MagstatsParams};
//!
//! let batch = LightCurveBatch::new(
//!     vec![Detection::new("c1", "AID1", 1, 59000.0, 17.5, 0.1)],
//!     vec![],
//! )
//! .unwrap();
//! let output = compute_magstats(&batch, &MagstatsParams::default()).unwrap();
//!
//! println!("{}", output.objects_table());
//! println!("{}", output.filters_table().with_precision(2));
//! ```
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::{
    magstats::MagstatsOutput,
    records::{FilterStats, ObjectStats},
};

enum TableMode {
    Objects,
    Filters,
}

/// Display adaptor rendering one of the record sets of a [`MagstatsOutput`].
///
/// Precision
/// -----------------
/// * `prec` – fractional digits of magnitudes, coordinates and rates (default = 3).
///   Epochs always use 5 digits.
pub struct MagstatsDisplay<'a> {
    output: &'a MagstatsOutput,
    mode: TableMode,
    prec: usize,
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn opt_f64(value: Option<f64>, prec: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.prec$}"))
}

fn right(content: String) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

impl<'a> MagstatsDisplay<'a> {
    pub fn objects(output: &'a MagstatsOutput) -> Self {
        MagstatsDisplay {
            output,
            mode: TableMode::Objects,
            prec: 3,
        }
    }

    pub fn filters(output: &'a MagstatsOutput) -> Self {
        MagstatsDisplay {
            output,
            mode: TableMode::Filters,
            prec: 3,
        }
    }

    pub fn with_precision(mut self, p: usize) -> Self {
        self.prec = p;
        self
    }

    fn new_table(header: Vec<&str>) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header);
        table
    }

    fn object_row(&self, o: &ObjectStats) -> Row {
        let p = self.prec;
        let position = |mean: Option<f64>, sigma: Option<f64>| match (mean, sigma) {
            (Some(m), Some(s)) => format!("{m:.p$} ± {s:.p$}"),
            _ => "-".to_string(),
        };
        let flags = format!(
            "{}{}",
            if o.corrected == Some(true) { "C" } else { "" },
            if o.stellar == Some(true) { "S" } else { "" }
        );

        Row::from(vec![
            Cell::new(&o.aid),
            Cell::new(o.oid.join(",")),
            right(opt(o.ndet)),
            right(opt_f64(o.firstmjd, 5)),
            right(opt_f64(o.lastmjd, 5)),
            right(position(o.meanra, o.sigmara)),
            right(position(o.meandec, o.sigmadec)),
            Cell::new(flags),
        ])
    }

    fn filter_row(&self, m: &FilterStats) -> Row {
        let p = self.prec;
        Row::from(vec![
            Cell::new(&m.aid),
            right(m.fid.to_string()),
            right(opt(m.ndet)),
            right(opt_f64(m.magmean, p)),
            right(opt_f64(m.magmedian, p)),
            right(opt_f64(m.magsigma, p)),
            right(opt_f64(m.magfirst, p)),
            right(opt_f64(m.maglast, p)),
            right(opt_f64(m.saturation_rate, p)),
            right(opt_f64(m.dmdt.map(|d| d.dmdt_first), p)),
        ])
    }

    fn render(&self) -> Table {
        match self.mode {
            TableMode::Objects => {
                let mut table = Self::new_table(vec![
                    "aid",
                    "oid",
                    "ndet",
                    "first MJD",
                    "last MJD",
                    "RA [deg] ±σ[arcsec]",
                    "DEC [deg] ±σ[arcsec]",
                    "flags",
                ]);
                for o in &self.output.objects {
                    table.add_row(self.object_row(o));
                }
                table
            }
            TableMode::Filters => {
                let mut table = Self::new_table(vec![
                    "aid", "fid", "ndet", "mean", "median", "σ", "first", "last", "sat. rate",
                    "dmdt",
                ]);
                for m in &self.output.magstats {
                    table.add_row(self.filter_row(m));
                }
                table
            }
        }
    }
}

impl fmt::Display for MagstatsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ergonomic builders for [`MagstatsDisplay`].
pub trait MagstatsDisplayExt {
    /// One row per object.
    fn objects_table(&self) -> MagstatsDisplay<'_>;

    /// One row per `(aid, fid)` pair.
    fn filters_table(&self) -> MagstatsDisplay<'_>;

    /// Both tables, objects first, as an owned string.
    fn show_string(&self) -> String {
        format!("{}\n{}", self.objects_table(), self.filters_table())
    }
}

impl MagstatsDisplayExt for MagstatsOutput {
    fn objects_table(&self) -> MagstatsDisplay<'_> {
        MagstatsDisplay::objects(self)
    }

    fn filters_table(&self) -> MagstatsDisplay<'_> {
        MagstatsDisplay::filters(self)
    }
}
