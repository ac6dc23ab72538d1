//! Genome interpretation variants and their layout metadata.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Number of genes making up one base function or one link.
pub const TRIPLET: usize = 3;

/// How the flat gene vectors of a genome are interpreted.
///
/// The variant is chosen once for a population; switching it means building a new
/// population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VariantKind {
    /// Independent scalar genes.
    #[default]
    Default,
    /// Float triplets are base functions, integer triplets are links
    /// `(base function index or -1, input node, output node)`.
    NeuraNet(NeuraNetLayout),
    /// Float genes split into a shared convolution block of cells followed by a
    /// per-output block. Only float genes evolve.
    NeuraNetConv(ConvLayout),
}

impl VariantKind {
    /// Check the layout against the gene counts of a population.
    pub fn validate(
        &self,
        float_gene_count: usize,
        int_gene_count: usize,
    ) -> Result<(), ConfigError> {
        match self {
            VariantKind::Default => Ok(()),
            VariantKind::NeuraNet(layout) => layout.validate(float_gene_count, int_gene_count),
            VariantKind::NeuraNetConv(layout) => layout.validate(float_gene_count),
        }
    }
}

/// Neuron layout of a NeuraNet genome.
///
/// Nodes are numbered in topological order: inputs first, then hidden nodes, then
/// outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuraNetLayout {
    /// Number of input nodes.
    pub inputs: usize,
    /// Number of hidden nodes.
    #[serde(default)]
    pub hidden: usize,
    /// Number of output nodes.
    pub outputs: usize,
    /// Whether links can be switched on/off and rewired by mutation.
    #[serde(default)]
    pub mutable_links: bool,
}

impl NeuraNetLayout {
    /// Total number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.inputs + self.hidden + self.outputs
    }

    /// Id of the first output node.
    #[inline]
    pub fn first_output(&self) -> usize {
        self.inputs + self.hidden
    }

    /// Whether `node` is a hidden node.
    #[inline]
    pub fn is_hidden(&self, node: usize) -> bool {
        node >= self.inputs && node < self.first_output()
    }

    /// Whether `node` is an output node.
    #[inline]
    pub fn is_output(&self, node: usize) -> bool {
        node >= self.first_output() && node < self.node_count()
    }

    /// Validate the layout against gene counts.
    pub fn validate(
        &self,
        float_gene_count: usize,
        int_gene_count: usize,
    ) -> Result<(), ConfigError> {
        if self.inputs == 0 || self.outputs == 0 {
            return Err(ConfigError::InvalidLayout(
                "NeuraNet needs at least one input and one output node".into(),
            ));
        }
        if float_gene_count == 0 || float_gene_count % TRIPLET != 0 {
            return Err(ConfigError::InvalidLayout(format!(
                "NeuraNet float genes must be a non-zero multiple of 3 (got {float_gene_count})"
            )));
        }
        if int_gene_count % TRIPLET != 0 {
            return Err(ConfigError::InvalidLayout(format!(
                "NeuraNet int genes must be a multiple of 3 (got {int_gene_count})"
            )));
        }
        let links = int_gene_count / TRIPLET;
        if links < self.outputs {
            return Err(ConfigError::InvalidLayout(format!(
                "NeuraNet needs at least one link per output ({links} links for {} outputs)",
                self.outputs
            )));
        }
        Ok(())
    }
}

/// Layout of the convolution block of a NeuraNetConv genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvLayout {
    /// Number of base functions in the shared convolution block.
    pub base_conv: usize,
    /// Number of base functions per convolution cell.
    pub bases_per_cell: usize,
}

impl ConvLayout {
    /// Number of float genes in one convolution cell.
    #[inline]
    pub fn cell_len(&self) -> usize {
        self.bases_per_cell * TRIPLET
    }

    /// Number of float genes in the convolution block.
    #[inline]
    pub fn conv_len(&self) -> usize {
        self.base_conv * TRIPLET
    }

    /// Number of convolution cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.base_conv / self.bases_per_cell
    }

    pub fn validate(&self, float_gene_count: usize) -> Result<(), ConfigError> {
        if self.bases_per_cell == 0 || self.base_conv % self.bases_per_cell != 0 {
            return Err(ConfigError::InvalidLayout(format!(
                "convolution bases ({}) must be a multiple of the non-zero cell size ({})",
                self.base_conv, self.bases_per_cell
            )));
        }
        if float_gene_count % TRIPLET != 0 || self.conv_len() > float_gene_count {
            return Err(ConfigError::InvalidLayout(format!(
                "{float_gene_count} float genes cannot hold {} convolution bases in triplets",
                self.base_conv
            )));
        }
        Ok(())
    }
}
