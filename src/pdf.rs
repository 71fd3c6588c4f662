//! PDF adapter over `lopdf`.
//!
//! Exposes only what the batch loop needs: open a document, enumerate its
//! pages, copy them into a fresh document, encrypt it, and write it out.
//! Nothing here looks inside page content.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions, StringFormat, dictionary};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::{ENCRYPTION_KEY_LENGTH, FILE_ID_LENGTH, INHERITABLE_PAGE_KEYS, MAX_PAGE_TREE_DEPTH, MIN_PDF_VERSION};
use crate::error::{Error, Result};
use crate::secret::Password;

/// A document read from disk, pages listed in source order.
pub struct SourceDocument {
    path: PathBuf,
    inner: Document,
    pages: Vec<ObjectId>,
    page_set: BTreeSet<ObjectId>,
    fingerprint: [u8; FILE_ID_LENGTH],
}

impl SourceDocument {
    /// Reads and parses the whole file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Document`] if it is
    /// not a PDF or is already password protected.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(Error::io(path))?;
        let inner = Document::load_mem(&bytes).map_err(Error::document(path))?;

        // lopdf opens documents with an empty user password on its own, leaving
        // only the stored encryption state behind.
        if inner.is_encrypted() || inner.encryption_state.is_some() {
            return Err(Error::Document { path: path.to_path_buf(), reason: "document is already password protected".to_owned() });
        }

        let pages: Vec<ObjectId> = inner.get_pages().into_values().collect();
        let page_set = pages.iter().copied().collect();

        let mut fingerprint = [0u8; FILE_ID_LENGTH];
        fingerprint.copy_from_slice(&blake3::hash(&bytes).as_bytes()[..FILE_ID_LENGTH]);

        Ok(Self { path: path.to_path_buf(), inner, pages, page_set, fingerprint })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page at zero-based `index`, if there is one.
    pub fn page(&self, index: usize) -> Option<Page<'_>> {
        self.pages.get(index).map(|&id| Page { source: self, id })
    }

    /// Trailer `/ID` for derived documents: the source's own when it is usable,
    /// otherwise one built from a hash of the source bytes.
    fn file_id(&self) -> Object {
        let usable = self.inner.trailer.get(b"ID").and_then(Object::as_array).is_ok_and(|ids| ids.len() == 2 && ids.iter().all(|id| id.as_str().is_ok()));

        match self.inner.trailer.get(b"ID") {
            Ok(id) if usable => id.clone(),
            _ => {
                let id = Object::String(self.fingerprint.to_vec(), StringFormat::Hexadecimal);
                Object::Array(vec![id.clone(), id])
            }
        }
    }
}

/// Borrowed handle on one page of a [`SourceDocument`].
#[derive(Clone, Copy)]
pub struct Page<'a> {
    source: &'a SourceDocument,
    id: ObjectId,
}

/// A new document assembled page by page.
///
/// All pages must come from the same source document; object numbers are
/// remapped from that source into this one.
pub struct OutputDocument {
    origin: PathBuf,
    inner: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    imported: BTreeMap<ObjectId, ObjectId>,
    file_id: Object,
}

impl OutputDocument {
    /// Starts an empty document that will receive pages of `source`.
    pub fn derived_from(source: &SourceDocument) -> Self {
        let version = source.inner.version.as_str();
        let version = if version < MIN_PDF_VERSION { MIN_PDF_VERSION } else { version };

        let mut inner = Document::with_version(version);
        let pages_id = inner.new_object_id();
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        inner.trailer.set("Root", Object::Reference(catalog_id));

        let mut document = Self { origin: source.path.clone(), inner, pages_id, kids: Vec::new(), imported: BTreeMap::new(), file_id: source.file_id() };
        document.update_page_tree();
        document
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Appends `page` after the pages added so far.
    ///
    /// Attributes the page inherits from its page tree are copied onto it, and
    /// every object it references is pulled in once.
    pub fn add_page(&mut self, page: Page<'_>) -> Result<()> {
        let source = page.source;
        let mut dict = source.inner.get_dictionary(page.id).map_err(Error::document(&source.path))?.clone();

        inherit_attributes(&source.inner, &mut dict);
        dict.remove(b"Parent");

        let mut pending = Vec::new();
        let page_id = self.remap_id(page.id, source, &mut pending);

        for (_, value) in dict.iter_mut() {
            self.remap_object(value, source, &mut pending);
        }
        dict.set("Parent", Object::Reference(self.pages_id));
        self.inner.objects.insert(page_id, Object::Dictionary(dict));

        while let Some(old_id) = pending.pop() {
            let new_id = self.imported[&old_id];
            let mut object = source.inner.objects.get(&old_id).cloned().unwrap_or(Object::Null);
            self.remap_object(&mut object, source, &mut pending);
            self.inner.objects.insert(new_id, object);
        }

        self.kids.push(Object::Reference(page_id));
        self.update_page_tree();

        Ok(())
    }

    /// Applies the standard security handler with `password` as both user
    /// and owner password.
    pub fn encrypt(&mut self, password: &Password) -> Result<()> {
        self.inner.trailer.set("ID", self.file_id.clone());

        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &self.inner,
            owner_password: password.expose_secret(),
            user_password: password.expose_secret(),
            key_length: ENCRYPTION_KEY_LENGTH,
            permissions: Permissions::all(),
        })
        .map_err(Error::document(&self.origin))?;

        self.inner.encrypt(&state).map_err(Error::document(&self.origin))?;
        debug!(source = %self.origin.display(), "document encrypted");

        Ok(())
    }

    /// Writes the document to `path`.
    ///
    /// The bytes go to a temporary file next to `path` first and are renamed
    /// into place once complete, so a failed write leaves nothing behind. The
    /// result carries the source file's permissions.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        let folder = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let mut staged = NamedTempFile::new_in(folder).map_err(Error::io(folder))?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            self.inner.save_to(&mut writer).map_err(Error::document(path))?;
            writer.flush().map_err(Error::io(path))?;
        }

        if let Ok(meta) = fs::metadata(&self.origin) {
            staged.as_file().set_permissions(meta.permissions()).map_err(Error::io(path))?;
        }

        staged.as_file().sync_all().map_err(Error::io(path))?;
        staged.persist(path).map_err(|e| Error::Io { path: path.to_path_buf(), source: e.error })?;

        Ok(())
    }

    fn update_page_tree(&mut self) {
        let count = i64::try_from(self.kids.len()).unwrap_or(i64::MAX);
        self.inner.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids.clone(),
                "Count" => count,
            }),
        );
    }

    /// New object number for `old_id`, allocating one on first sight.
    ///
    /// Pages are never queued for copying here; `add_page` fills them in so
    /// that cross-page links resolve to the copied page.
    fn remap_id(&mut self, old_id: ObjectId, source: &SourceDocument, pending: &mut Vec<ObjectId>) -> ObjectId {
        if let Some(&new_id) = self.imported.get(&old_id) {
            return new_id;
        }

        let new_id = self.inner.new_object_id();
        self.imported.insert(old_id, new_id);

        if !source.page_set.contains(&old_id) {
            pending.push(old_id);
        }

        new_id
    }

    fn remap_object(&mut self, object: &mut Object, source: &SourceDocument, pending: &mut Vec<ObjectId>) {
        match object {
            Object::Reference(id) => *id = self.remap_id(*id, source, pending),
            Object::Array(items) => {
                for item in items.iter_mut() {
                    self.remap_object(item, source, pending);
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter_mut() {
                    self.remap_object(value, source, pending);
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    self.remap_object(value, source, pending);
                }
            }
            _ => {}
        }
    }
}

/// Copies attributes inherited through the page tree onto the page itself.
fn inherit_attributes(document: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let Some(node) = parent.and_then(|id| document.get_dictionary(id).ok()) else {
            break;
        };

        for &key in INHERITABLE_PAGE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
}

/// Writes a small unencrypted PDF with `pages` pages reading "Page 1", "Page 2", ...
///
/// Font and media box live on the page tree node so copies must inherit them.
#[cfg(test)]
pub(crate) fn write_sample_pdf(path: &Path, pages: usize) {
    use lopdf::Stream;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 720 Td (Page {number}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
