//! Mutation corpus: header families, mutation operators, generation
//! strategies, and persistence into the store

pub mod builder;
pub mod family;
pub mod mutation;
pub mod strategy;
pub mod values;

pub use builder::{CorpusBuilder, CorpusReport};
pub use family::{
    builtin_basic_corpora, builtin_families, builtin_multi_families, BasicCorpus, HeaderFamily,
    MultiHeaderFamily,
};
pub use mutation::{basic_mutations, general_mutations, mutate_header_name, mutate_header_value, Mutation};
pub use values::{load_value_list, parse_value_list, UrlForms, URL_REP};
