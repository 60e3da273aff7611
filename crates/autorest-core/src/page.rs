//! Paginated result envelope.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One page of rows plus the metadata a grid needs to page through the rest.
///
/// `totalPages`, `hasPrevious` and `hasNext` are derived from the other
/// fields when serialized and cannot be set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    data: Vec<T>,
    total_count: u64,
    page: u32,
    page_size: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        Self {
            data,
            total_count,
            page,
            page_size: page_size.max(1),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

impl<T: Serialize> Serialize for PaginatedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PaginatedResult", 7)?;
        s.serialize_field("data", &self.data)?;
        s.serialize_field("totalCount", &self.total_count)?;
        s.serialize_field("page", &self.page)?;
        s.serialize_field("pageSize", &self.page_size)?;
        s.serialize_field("totalPages", &self.total_pages())?;
        s.serialize_field("hasPrevious", &self.has_previous())?;
        s.serialize_field("hasNext", &self.has_next())?;
        s.end()
    }
}
