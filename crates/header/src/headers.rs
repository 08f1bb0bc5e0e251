//! Header collections.
//!
//! [`HttpHeaders`] maps case-insensitive names to [`Header`]s behind a single lock.
//! Managed headers are registered when the collection is built and live as long as
//! it does, an unset managed header is only hidden. Unmanaged headers come and go with
//! their value.

use std::fmt;
use std::ops::Deref;
use std::vec;

use indexmap::IndexMap;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::trace;

use crate::managed::{Connection, ContentLength, ContentRange, ContentType, Date, Range, TransferEncoding};
use crate::utils::{ensure, header_key};
use crate::{Header, HeaderError, ManagedHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Replaced,
    Removed,
}

/// Describes a header set or removed through [`HttpHeaders::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderChange {
    pub name: String,
    pub kind: ChangeKind,
}

type Listener = Box<dyn Fn(&HeaderChange) + Send + Sync>;

/// An ordered, case-insensitive header collection.
///
/// Enumeration follows registration order for managed headers and insertion order for
/// the others, skipping headers without value.
///
/// # Deadlock
///
/// Change listeners run while the collection lock is held: a listener must not call
/// back into the collection it listens to.
pub struct HttpHeaders {
    headers: Mutex<IndexMap<String, Header>>,
    listeners: Vec<Listener>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self { headers: Mutex::new(IndexMap::new()), listeners: Vec::new() }
    }

    /// Builds a collection with the given managed headers registered.
    pub fn with_managed<I: IntoIterator<Item = Header>>(managed: I) -> Self {
        let headers = managed.into_iter().map(|header| (header_key(header.name()), header)).collect();
        Self { headers: Mutex::new(headers), listeners: Vec::new() }
    }

    /// Registers a listener called on every change made through [`HttpHeaders::set`].
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: Fn(&HeaderChange) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Returns the raw value of the header, the name is trimmed and compared ignoring case.
    pub fn get(&self, name: &str) -> Option<String> {
        let headers = self.headers.lock();
        headers.get(&header_key(name)).and_then(Header::raw).map(str::to_string)
    }

    pub fn contains(&self, name: &str) -> bool {
        let headers = self.headers.lock();
        headers.get(&header_key(name)).and_then(Header::raw).is_some()
    }

    /// Sets the raw value of a header, `None` removes it.
    ///
    /// An existing header is updated in place, keeping its position. An unmanaged
    /// header also takes the casing of `name`.
    pub fn set(&self, name: &str, value: Option<&str>) -> Result<(), HeaderError> {
        ensure!(!name.trim().is_empty(), HeaderError::InvalidName);
        let key = header_key(name);

        let mut headers = self.headers.lock();
        let kind = match value {
            None => {
                let Some(header) = headers.get_mut(&key) else {
                    return Ok(());
                };
                if header.is_managed() {
                    header.set_raw(None)?;
                } else {
                    headers.shift_remove(&key);
                }
                ChangeKind::Removed
            }
            Some(value) => match headers.get_mut(&key) {
                Some(header) => {
                    header.set_raw(Some(value))?;
                    if let Header::Unmanaged(unmanaged) = header {
                        unmanaged.set_name(name);
                    }
                    ChangeKind::Replaced
                }
                None => {
                    headers.insert(key, Header::unmanaged(name, value)?);
                    ChangeKind::Added
                }
            },
        };

        trace!(name = name.trim(), ?kind, "header changed");
        let change = HeaderChange { name: name.trim().to_string(), kind };
        for listener in &self.listeners {
            listener(&change);
        }
        Ok(())
    }

    /// Iterates `(name, raw value)` pairs.
    ///
    /// The names are captured when the iterator is created and each value is read when
    /// reached, so headers may be changed while iterating: a header removed in between
    /// is skipped, no other is.
    pub fn iter(&self) -> Iter<'_> {
        let keys: Vec<String> = self.headers.lock().keys().cloned().collect();
        Iter { headers: self, keys: keys.into_iter() }
    }

    /// Number of headers with a value.
    pub fn len(&self) -> usize {
        self.headers.lock().values().filter(|header| header.raw().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the collection and gives access to a managed header, `None` if `T` is not
    /// registered.
    ///
    /// Changes made through the guard do not notify the change listeners.
    pub fn managed<T: ManagedHeader>(&self) -> Option<MappedMutexGuard<'_, T>> {
        MutexGuard::try_map(self.headers.lock(), |headers| headers.get_mut(T::KEY).and_then(T::from_header_mut)).ok()
    }

    /// Like [`HttpHeaders::managed`] for a header registered at construction. A missing
    /// registration is restored with an unset header.
    fn registered<T: ManagedHeader>(&self) -> MappedMutexGuard<'_, T> {
        let mut headers = self.headers.lock();
        loop {
            match MutexGuard::try_map(headers, |headers| headers.get_mut(T::KEY).and_then(T::from_header_mut)) {
                Ok(header) => return header,
                Err(mut unregistered) => {
                    trace!(name = T::NAME, "managed header registered again");
                    unregistered.insert(T::KEY.to_string(), T::default().into_header());
                    headers = unregistered;
                }
            }
        }
    }
}

impl Default for HttpHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Writes `Name: value\r\n` for each header, without the closing blank line.
impl fmt::Display for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a HttpHeaders {
    type Item = (String, String);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`HttpHeaders::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    headers: &'a HttpHeaders,
    keys: vec::IntoIter<String>,
}

impl Iterator for Iter<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.keys.by_ref() {
            let headers = self.headers.headers.lock();
            let Some(header) = headers.get(&key) else {
                continue;
            };
            if let Some(raw) = header.raw() {
                return Some((header.name().to_string(), raw.to_string()));
            }
        }
        None
    }
}

/// Headers of a request, with `Connection`, `Transfer-Encoding`, `Content-Length`,
/// `Content-Type` and `Range` managed.
#[derive(Debug)]
pub struct RequestHeaders {
    headers: HttpHeaders,
}

impl RequestHeaders {
    pub fn new() -> Self {
        let headers = HttpHeaders::with_managed([
            Connection::default().into_header(),
            TransferEncoding::default().into_header(),
            ContentLength::default().into_header(),
            ContentType::default().into_header(),
            Range::default().into_header(),
        ]);
        Self { headers }
    }

    pub fn connection(&self) -> MappedMutexGuard<'_, Connection> {
        self.headers.registered()
    }

    pub fn transfer_encoding(&self) -> MappedMutexGuard<'_, TransferEncoding> {
        self.headers.registered()
    }

    pub fn content_length(&self) -> MappedMutexGuard<'_, ContentLength> {
        self.headers.registered()
    }

    pub fn content_type(&self) -> MappedMutexGuard<'_, ContentType> {
        self.headers.registered()
    }

    pub fn range(&self) -> MappedMutexGuard<'_, Range> {
        self.headers.registered()
    }

    pub fn host(&self) -> Option<String> {
        self.headers.get("Host")
    }

    pub fn user_agent(&self) -> Option<String> {
        self.headers.get("User-Agent")
    }

    pub fn set_user_agent(&self, user_agent: Option<&str>) -> Result<(), HeaderError> {
        self.headers.set("User-Agent", user_agent)
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: Fn(&HeaderChange) + Send + Sync + 'static,
    {
        self.headers.on_change(listener);
    }
}

impl Default for RequestHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for RequestHeaders {
    type Target = HttpHeaders;

    fn deref(&self) -> &Self::Target {
        &self.headers
    }
}

impl fmt::Display for RequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.headers, f)
    }
}

/// Headers of a response, with `Connection`, `Transfer-Encoding`, `Content-Length`,
/// `Content-Type`, `Date` and `Content-Range` managed.
#[derive(Debug)]
pub struct ResponseHeaders {
    headers: HttpHeaders,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        let headers = HttpHeaders::with_managed([
            Connection::default().into_header(),
            TransferEncoding::default().into_header(),
            ContentLength::default().into_header(),
            ContentType::default().into_header(),
            Date::default().into_header(),
            ContentRange::default().into_header(),
        ]);
        Self { headers }
    }

    pub fn connection(&self) -> MappedMutexGuard<'_, Connection> {
        self.headers.registered()
    }

    pub fn transfer_encoding(&self) -> MappedMutexGuard<'_, TransferEncoding> {
        self.headers.registered()
    }

    pub fn content_length(&self) -> MappedMutexGuard<'_, ContentLength> {
        self.headers.registered()
    }

    pub fn content_type(&self) -> MappedMutexGuard<'_, ContentType> {
        self.headers.registered()
    }

    pub fn date(&self) -> MappedMutexGuard<'_, Date> {
        self.headers.registered()
    }

    pub fn content_range(&self) -> MappedMutexGuard<'_, ContentRange> {
        self.headers.registered()
    }

    pub fn server(&self) -> Option<String> {
        self.headers.get("Server")
    }

    pub fn set_server(&self, server: Option<&str>) -> Result<(), HeaderError> {
        self.headers.set("Server", server)
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: Fn(&HeaderChange) + Send + Sync + 'static,
    {
        self.headers.on_change(listener);
    }
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ResponseHeaders {
    type Target = HttpHeaders;

    fn deref(&self) -> &Self::Target {
        &self.headers
    }
}

impl fmt::Display for ResponseHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.headers, f)
    }
}
