//! Clients for the services Redraft depends on but does not own.

pub mod retrieval;

pub use retrieval::{
    enhance_query, format_documents_for_context, DocumentSearch, InstructionRetriever,
    RetrievalError, RetrievedDocument, SearchContext,
};
#[cfg(feature = "vectorize")]
pub use retrieval::vectorize::{VectorizeClient, VectorizeConfig};
