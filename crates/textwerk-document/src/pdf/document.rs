// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document handle: open, inspect, extract page text, and save, using the
// `lopdf` crate. Mutations live in `annotate`, `redact`, and `insert`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, info, instrument};

use super::geometry::PageGeometry;
use super::objects::{page_content, page_dict_mut, page_resources, resolve};
use crate::text::TextPage;
use crate::text::interpret::{Interpretation, Interpreter};
use crate::text::layout;

/// An open PDF document.
///
/// Wraps `lopdf::Document`. Pages are addressed by 0-based index; the lopdf
/// page tree is 1-based and the conversion happens here.
pub struct PdfDocument {
    /// The underlying lopdf document.
    pub(crate) document: Document,
    /// Source path, if opened from a file.
    source_path: Option<PathBuf>,
    /// Pages whose original content has been enclosed in `q`/`Q`.
    pub(crate) wrapped_pages: HashSet<ObjectId>,
    /// Font dictionaries already added to the document, by `/BaseFont`.
    pub(crate) font_objects: HashMap<String, ObjectId>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            TextwerkError::DocumentOpen(format!("{}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        let mut opened = Self::from_document(document);
        opened.source_path = Some(path_ref.to_path_buf());
        Ok(opened)
    }

    /// Load a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            TextwerkError::DocumentOpen(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            source_path: None,
            wrapped_pages: HashSet::new(),
            font_objects: HashMap::new(),
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the document was created via [`PdfDocument::open`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    /// Object id of the page at 0-based `page`.
    pub fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        u32::try_from(page + 1)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or_else(|| {
                TextwerkError::Pdf(format!(
                    "page {} out of range (document has {} pages)",
                    page,
                    pages.len()
                ))
            })
    }

    // -- Extraction -----------------------------------------------------------

    /// Structured text of the page at 0-based `page`.
    #[instrument(skip(self))]
    pub fn text_page(&self, page: usize) -> Result<TextPage> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::of_page(&self.document, page_id);
        let (_, interpretation) = self.interpret(page_id, geometry)?;
        let text_page = layout::build(page, geometry, &interpretation.glyphs);
        debug!(
            glyphs = interpretation.glyphs.len(),
            blocks = text_page.blocks.len(),
            "page text extracted"
        );
        Ok(text_page)
    }

    /// Decode the page content and run the text interpreter over it.
    pub(crate) fn interpret(
        &self,
        page_id: ObjectId,
        geometry: PageGeometry,
    ) -> Result<(Content, Interpretation)> {
        let bytes = page_content(&self.document, page_id)?;
        let content = Content::decode(&bytes).map_err(|err| {
            TextwerkError::Pdf(format!("cannot decode content of page {page_id:?}: {err}"))
        })?;
        let resources = page_resources(&self.document, page_id);
        let interpretation =
            Interpreter::new(&self.document, &resources, geometry).run(&content.operations);
        Ok((content, interpretation))
    }

    // -- Content streams ------------------------------------------------------

    /// Encode `operations` as a new stream object.
    pub(crate) fn add_content_stream(&mut self, operations: Vec<Operation>) -> Result<ObjectId> {
        let content = Content { operations };
        let bytes = content
            .encode()
            .map_err(|err| TextwerkError::Pdf(format!("cannot encode content stream: {err}")))?;
        Ok(self
            .document
            .add_object(Object::Stream(Stream::new(Dictionary::new(), bytes))))
    }

    /// References to the page's content streams, in order.
    pub(crate) fn content_refs(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let page = self
            .document
            .get_dictionary(page_id)
            .map_err(|err| TextwerkError::Pdf(format!("page object {page_id:?}: {err}")))?;
        Ok(match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match resolve(&self.document, &Object::Reference(*id)) {
                Object::Array(parts) => parts.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(parts)) => parts.clone(),
            _ => Vec::new(),
        })
    }

    pub(crate) fn set_content_refs(&mut self, page_id: ObjectId, refs: Vec<Object>) -> Result<()> {
        page_dict_mut(&mut self.document, page_id)?.set("Contents", Object::Array(refs));
        Ok(())
    }

    /// Enclose the page's existing content in `q`/`Q` so that anything
    /// appended afterwards starts from the default graphics state.
    pub(crate) fn wrap_page(&mut self, page_id: ObjectId) -> Result<()> {
        if self.wrapped_pages.contains(&page_id) {
            return Ok(());
        }
        let mut refs = self.content_refs(page_id)?;
        if !refs.is_empty() {
            let open = self.add_content_stream(vec![Operation::new("q", vec![])])?;
            let close = self.add_content_stream(vec![Operation::new("Q", vec![])])?;
            refs.insert(0, Object::Reference(open));
            refs.push(Object::Reference(close));
            self.set_content_refs(page_id, refs)?;
        }
        self.wrapped_pages.insert(page_id);
        Ok(())
    }

    /// Append `operations` to the end of the page content.
    pub(crate) fn append_content(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        self.wrap_page(page_id)?;
        let stream = self.add_content_stream(operations)?;
        let mut refs = self.content_refs(page_id)?;
        refs.push(Object::Reference(stream));
        self.set_content_refs(page_id, refs)
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document to bytes.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        self.document.compress();
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| TextwerkError::Pdf(format!("failed to serialise PDF: {}", err)))?;
        Ok(output)
    }

    /// Write the document to `path`.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let output = self.save_to_bytes()?;
        std::fs::write(path.as_ref(), &output)?;
        info!(output_bytes = output.len(), "PDF saved");
        Ok(())
    }
}
