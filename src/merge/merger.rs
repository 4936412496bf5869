//! Page-tree concatenation of loaded PDF documents.
//!
//! The first document is the base. Every later document is renumbered past
//! the base's highest object id, its objects are moved over, and its pages
//! are appended to the base's root page tree in their original order.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{ArtifactError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page-tree depth when walking `Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// Concatenates documents into one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConcatenator;

impl PdfConcatenator {
    /// Create a new concatenator.
    pub fn new() -> Self {
        Self
    }

    /// Concatenate `documents` in order.
    ///
    /// Every page of every document is kept, in original order. Appended
    /// pages are re-parented onto the base's root `Pages` node; attributes
    /// they inherited from their old ancestors are copied onto the page so
    /// they render the same. Attributes set on the base's root node are
    /// moved down onto the base's own pages first, so appended pages never
    /// pick them up. Objects left unreachable (the old catalogs and page
    /// trees) are pruned.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NoValidInputs`] for an empty list and
    /// [`ArtifactError::Concatenation`] if the base page tree is malformed.
    pub fn concatenate(&self, documents: Vec<Document>) -> Result<Document> {
        let mut documents = documents.into_iter().peekable();
        let mut merged = documents.next().ok_or(ArtifactError::NoValidInputs)?;

        let root_pages = root_pages_id(&mut merged)?;
        if documents.peek().is_some() {
            push_down_root_attributes(&mut merged, root_pages)?;
        }
        let mut max_id = merged.max_id;
        let mut appended = 0usize;

        for mut doc in documents {
            // Avoid object id collisions by renumbering the incoming document
            doc.renumber_objects_with(max_id + 1);
            max_id = max_id.max(doc.max_id);

            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
            let inherited: Vec<Vec<(Vec<u8>, Object)>> = page_ids
                .iter()
                .map(|&id| inherited_attributes(&doc, id))
                .collect();

            merged.objects.extend(doc.objects);

            for (&page_id, attributes) in page_ids.iter().zip(inherited) {
                let page = merged
                    .get_object_mut(page_id)
                    .and_then(Object::as_dict_mut)
                    .map_err(|e| {
                        ArtifactError::concatenation(format!("page {page_id:?} is not a dictionary: {e}"))
                    })?;
                for (key, value) in attributes {
                    page.set(key, value);
                }
                page.set("Parent", Object::Reference(root_pages));
            }

            append_pages_to_tree(&mut merged, root_pages, &page_ids)?;
            appended += page_ids.len();
        }

        merged.max_id = max_id;

        if appended > 0 {
            let pruned = merged.prune_objects();
            tracing::debug!(
                appended_pages = appended,
                pruned_objects = pruned.len(),
                "concatenated documents"
            );
        }

        Ok(merged)
    }
}

fn root_pages_id(doc: &mut Document) -> Result<ObjectId> {
    doc.catalog_mut()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| ArtifactError::concatenation(format!("Failed to get pages reference: {e}")))
}

/// Copy every inherited attribute onto the base pages, then strip the
/// inheritable keys from the root `Pages` node.
fn push_down_root_attributes(merged: &mut Document, root_pages: ObjectId) -> Result<()> {
    let pending: Vec<(ObjectId, Vec<(Vec<u8>, Object)>)> = merged
        .get_pages()
        .into_values()
        .map(|id| (id, inherited_attributes(merged, id)))
        .filter(|(_, attributes)| !attributes.is_empty())
        .collect();

    for (page_id, attributes) in pending {
        let page = merged
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| ArtifactError::concatenation(format!("page {page_id:?} is not a dictionary: {e}")))?;
        for (key, value) in attributes {
            page.set(key, value);
        }
    }

    let root = merged
        .get_object_mut(root_pages)
        .and_then(Object::as_dict_mut)
        .map_err(|e| ArtifactError::concatenation(format!("Failed to get pages object: {e}")))?;
    for key in INHERITABLE {
        root.remove(key);
    }

    Ok(())
}

/// Append page references to the root Pages dictionary and patch Count.
fn append_pages_to_tree(merged: &mut Document, pages_id: ObjectId, page_ids: &[ObjectId]) -> Result<()> {
    let dict = merged
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| ArtifactError::concatenation(format!("Failed to get pages object: {e}")))?;

    let kids = dict
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|_| ArtifactError::concatenation("Pages dictionary missing Kids array"))?;
    kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));

    let current_count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

    Ok(())
}

/// Attributes `page_id` inherits from its ancestors and does not set itself.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE.iter().copied().filter(|k| !page.has(k)).collect();
    let mut found = Vec::new();
    let mut parent = parent_of(page);

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };
        if missing.is_empty() {
            break;
        }

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
    }

    found
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}
