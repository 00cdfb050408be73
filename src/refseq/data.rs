//! Bundled reference assembly metadata.

/// One sequence of a bundled assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblySequence {
    /// Sequence name, e.g. `chr1`.
    pub name: &'static str,
    /// Sequence length in base pairs.
    pub length: i64,
}

/// Name of the bundled GRCh38 analysis-set assembly.
pub const GRCH38_NO_ALT_ANALYSIS_SET: &str = "GRCh38_no_alt_analysis_set";

/// Primary sequences of `GRCh38_no_alt_analysis_set`, in analysis-set order
/// (rids are assigned 1-based in this order on a fresh catalog).
const GRCH38_NO_ALT_SEQUENCES: &[AssemblySequence] = &[
    AssemblySequence { name: "chr1", length: 248_956_422 },
    AssemblySequence { name: "chr2", length: 242_193_529 },
    AssemblySequence { name: "chr3", length: 198_295_559 },
    AssemblySequence { name: "chr4", length: 190_214_555 },
    AssemblySequence { name: "chr5", length: 181_538_259 },
    AssemblySequence { name: "chr6", length: 170_805_979 },
    AssemblySequence { name: "chr7", length: 159_345_973 },
    AssemblySequence { name: "chr8", length: 145_138_636 },
    AssemblySequence { name: "chr9", length: 138_394_717 },
    AssemblySequence { name: "chr10", length: 133_797_422 },
    AssemblySequence { name: "chr11", length: 135_086_622 },
    AssemblySequence { name: "chr12", length: 133_275_309 },
    AssemblySequence { name: "chr13", length: 114_364_328 },
    AssemblySequence { name: "chr14", length: 107_043_718 },
    AssemblySequence { name: "chr15", length: 101_991_189 },
    AssemblySequence { name: "chr16", length: 90_338_345 },
    AssemblySequence { name: "chr17", length: 83_257_441 },
    AssemblySequence { name: "chr18", length: 80_373_285 },
    AssemblySequence { name: "chr19", length: 58_617_616 },
    AssemblySequence { name: "chr20", length: 64_444_167 },
    AssemblySequence { name: "chr21", length: 46_709_983 },
    AssemblySequence { name: "chr22", length: 50_818_468 },
    AssemblySequence { name: "chrX", length: 156_040_895 },
    AssemblySequence { name: "chrY", length: 57_227_415 },
    AssemblySequence { name: "chrM", length: 16_569 },
    AssemblySequence { name: "chrEBV", length: 171_823 },
];

/// Look up a bundled assembly by name.
pub fn bundled_assembly(name: &str) -> Option<&'static [AssemblySequence]> {
    match name {
        GRCH38_NO_ALT_ANALYSIS_SET => Some(GRCH38_NO_ALT_SEQUENCES),
        _ => None,
    }
}
