use std::collections::HashMap;
use crate::document::Document;
use crate::service::ServiceId;

/// Responses already obtained while answering one query, by service address.
/// Lives exactly as long as one aggregation pass.
#[derive(Debug, Default)]
pub struct QueryMemo {
    responses: HashMap<ServiceId, Document>,
}

impl QueryMemo {
    pub fn get(&self, id: &ServiceId) -> Option<&Document> {
        self.responses.get(id)
    }

    pub fn record(&mut self, id: ServiceId, document: Document) {
        self.responses.insert(id, document);
    }

    pub(crate) fn len(&self) -> usize {
        self.responses.len()
    }
}
