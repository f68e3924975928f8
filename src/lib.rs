mod args;
mod error;
mod excel;
mod metadata;
mod pendencias;
mod regex;
mod relatorio;
mod sheets;
mod tabela;

pub use self::{
    args::*, error::*, excel::*, metadata::*, pendencias::*, regex::*, relatorio::*, sheets::*,
    tabela::*,
};
