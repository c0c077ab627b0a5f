use crate::clade::CladeConstraint;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::io::Write;

pub(crate) fn tsv_writer(out: &mut dyn Write) -> Writer<&mut dyn Write> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .from_writer(out)
}

/// `<prefix>.<clade>` per clade, then `<prefix>.root`.
pub fn slot_columns(prefix: &str, clades: &[CladeConstraint]) -> Vec<String> {
    clades
        .iter()
        .map(|c| format!("{}.{}", prefix, c.log_label()))
        .chain(std::iter::once(format!("{}.root", prefix)))
        .collect()
}
