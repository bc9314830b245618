//! X11 window source
//!
//! Builds a [`WindowRecord`] for every client in `_NET_CLIENT_LIST`. Reading
//! one window can fail (it may be destroyed between the list and the query);
//! such windows are logged and skipped, the rest of the pass continues.

use anyhow::{Context, Result};
use std::fs;
use tracing::{debug, warn};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11::{MAX_PROPERTY_LENGTH, PAGE_SIZE};
use crate::window::{Bounds, WindowRecord};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_client_list: Atom,
    pub net_wm_name: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_desktop: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_hidden: Atom,
    pub utf8_string: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            net_wm_pid: intern(conn, "_NET_WM_PID")?,
            net_wm_desktop: intern(conn, "_NET_WM_DESKTOP")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_hidden: intern(conn, "_NET_WM_STATE_HIDDEN")?,
            utf8_string: intern(conn, "UTF8_STRING")?,
        })
    }
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern {name} atom"))?
        .reply()
        .with_context(|| format!("Failed to get reply for {name} atom"))?
        .atom)
}

/// Client windows managed by the window manager, in its order
pub fn client_list(conn: &RustConnection, root: Window, atoms: &CachedAtoms) -> Result<Vec<Window>> {
    let prop = conn
        .get_property(false, root, atoms.net_client_list, AtomEnum::WINDOW, 0, u32::MAX)
        .context("Failed to query _NET_CLIENT_LIST")?
        .reply()
        .context("Failed to get reply for _NET_CLIENT_LIST")?;
    Ok(prop
        .value32()
        .ok_or_else(|| anyhow::anyhow!("Invalid return from _NET_CLIENT_LIST"))?
        .collect())
}

/// One record per readable client window
pub fn list_windows(conn: &RustConnection, screen: &Screen, atoms: &CachedAtoms) -> Result<Vec<WindowRecord>> {
    let clients = client_list(conn, screen.root, atoms)?;
    let windows: Vec<WindowRecord> = clients
        .iter()
        .filter_map(|&window| {
            read_window(conn, screen.root, atoms, window)
                .inspect_err(|e| warn!(window, error = ?e, "skipping unreadable window"))
                .ok()
        })
        .collect();
    debug!(clients = clients.len(), read = windows.len(), "enumerated windows");
    Ok(windows)
}

pub fn read_window(
    conn: &RustConnection,
    root: Window,
    atoms: &CachedAtoms,
    window: Window,
) -> Result<WindowRecord> {
    let owner_pid = cardinal(conn, window, atoms.net_wm_pid)?.map(i64::from);

    let attributes = conn
        .get_window_attributes(window)
        .context(format!("Failed to query attributes of window {window}"))?
        .reply()
        .context(format!("Failed to get attributes reply for window {window}"))?;
    let hidden = conn
        .get_property(false, window, atoms.net_wm_state, AtomEnum::ATOM, 0, MAX_PROPERTY_LENGTH)
        .context(format!("Failed to query _NET_WM_STATE for window {window}"))?
        .reply()
        .context(format!("Failed to get _NET_WM_STATE reply for window {window}"))?
        .value32()
        .is_some_and(|mut states| states.any(|state| state == atoms.net_wm_state_hidden));

    let geometry = conn
        .get_geometry(window)
        .context(format!("Failed to query geometry of window {window}"))?
        .reply()
        .context(format!("Failed to get geometry reply for window {window}"))?;
    let origin = conn
        .translate_coordinates(window, root, 0, 0)
        .context(format!("Failed to translate coordinates of window {window}"))?
        .reply()
        .context(format!("Failed to get coordinates reply for window {window}"))?;

    Ok(WindowRecord {
        owner_name: wm_class(conn, window)?,
        window_name: window_title(conn, window, atoms)?,
        owner_pid,
        window_number: Some(i64::from(window)),
        window_layer: cardinal(conn, window, atoms.net_wm_desktop)?.map(i64::from),
        memory_usage: owner_pid.and_then(resident_memory),
        is_onscreen: Some(attributes.map_state == MapState::VIEWABLE && !hidden),
        bounds: Some(Bounds::new(
            i64::from(origin.dst_x),
            i64::from(origin.dst_y),
            i64::from(geometry.width),
            i64::from(geometry.height),
        )),
    })
}

/// WM_CLASS is `instance\0class\0`; the class names the application
fn wm_class(conn: &RustConnection, window: Window) -> Result<Option<String>> {
    let prop = conn
        .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, MAX_PROPERTY_LENGTH)
        .context(format!("Failed to query WM_CLASS for window {window}"))?
        .reply()
        .context(format!("Failed to get WM_CLASS reply for window {window}"))?;
    Ok(parse_wm_class(&prop.value))
}

fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned());
    let instance = parts.next();
    parts.next().or(instance)
}

fn window_title(conn: &RustConnection, window: Window, atoms: &CachedAtoms) -> Result<Option<String>> {
    let utf8 = conn
        .get_property(false, window, atoms.net_wm_name, atoms.utf8_string, 0, MAX_PROPERTY_LENGTH)
        .context(format!("Failed to query _NET_WM_NAME for window {window}"))?
        .reply()
        .context(format!("Failed to get _NET_WM_NAME reply for window {window}"))?;
    if utf8.type_ != u32::from(AtomEnum::NONE) {
        return Ok(Some(String::from_utf8_lossy(&utf8.value).into_owned()));
    }

    let legacy = conn
        .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::ANY, 0, MAX_PROPERTY_LENGTH)
        .context(format!("Failed to query WM_NAME for window {window}"))?
        .reply()
        .context(format!("Failed to get WM_NAME reply for window {window}"))?;
    if legacy.type_ == u32::from(AtomEnum::NONE) {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&legacy.value).into_owned()))
}

fn cardinal(conn: &RustConnection, window: Window, atom: Atom) -> Result<Option<u32>> {
    let prop = conn
        .get_property(false, window, atom, AtomEnum::CARDINAL, 0, 1)
        .context(format!("Failed to query CARDINAL property {atom} for window {window}"))?
        .reply()
        .context(format!("Failed to get CARDINAL reply for window {window}"))?;
    Ok(prop.value32().and_then(|mut values| values.next()))
}

/// Resident set size of a process in bytes, from /proc/<pid>/statm
fn resident_memory(pid: i64) -> Option<i64> {
    let statm = fs::read_to_string(format!("/proc/{pid}/statm"))
        .inspect_err(|e| debug!(pid, error = %e, "cannot read statm"))
        .ok()?;
    parse_statm_resident(&statm)
}

fn parse_statm_resident(statm: &str) -> Option<i64> {
    statm
        .split_whitespace()
        .nth(1)?
        .parse::<i64>()
        .ok()
        .and_then(|pages| pages.checked_mul(PAGE_SIZE))
}
