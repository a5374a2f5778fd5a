//! Live-Chrome backend: session launch with a persistent profile, WhatsApp
//! navigation, and the [`Dom`] implementation over a DevTools tab.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use headless_chrome::browser::tab::ModifierKey;
use headless_chrome::{Browser, Element, LaunchOptionsBuilder, Tab};
use tracing::{debug, info, warn};

use crate::dom::{Dom, DomError, DomResult};
use crate::selectors;

pub const WHATSAPP_URL: &str = "https://web.whatsapp.com/";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Named Chrome profile, reused across runs so the operator only
    /// authenticates once.
    pub profile: String,
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
}

fn profile_dir(profile: &str, override_dir: Option<PathBuf>) -> PathBuf {
    if let Some(p) = override_dir {
        return p;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chatgrab")
        .join("profiles")
        .join(profile)
}

pub struct Session {
    // dropping the Browser tears the whole session down
    _browser: Browser,
    tab: Arc<Tab>,
}

impl Session {
    pub fn launch(cfg: &SessionConfig) -> Result<Self> {
        let user_dir = profile_dir(&cfg.profile, cfg.user_data_dir.clone());
        std::fs::create_dir_all(&user_dir)?;

        let arg_vec: Vec<OsString> = vec![
            OsString::from("--disable-gpu"),
            OsString::from("--disable-dev-shm-usage"),
            OsString::from("--disable-notifications"),
            OsString::from("--no-first-run"),
            OsString::from("--no-default-browser-check"),
            OsString::from("--window-size=1920,1080"),
        ];

        let launch_opts = LaunchOptionsBuilder::default()
            .headless(cfg.headless)
            .user_data_dir(Some(user_dir))
            // operator checkpoints can keep the session idle for minutes
            .idle_browser_timeout(Duration::from_secs(3600))
            .args(
                arg_vec
                    .iter()
                    .map(|s| s.as_os_str())
                    .collect::<Vec<&OsStr>>(),
            )
            .build()
            .unwrap();

        let browser = Browser::new(launch_opts)?;
        let tab = browser.new_tab()?;
        tab.set_user_agent(&ua_generator::ua::spoof_ua(), None, None)?;
        info!(profile = %cfg.profile, headless = cfg.headless, "chrome session ready");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub fn open_whatsapp(&self) -> Result<()> {
        self.tab.navigate_to(WHATSAPP_URL)?;
        self.tab.wait_until_navigated()?;
        info!(url = WHATSAPP_URL, "navigation complete");
        Ok(())
    }

    /// Opens the conversation through the client's search shortcut:
    /// platform modifier + `f`, type the name, click the hit whose title
    /// contains it, otherwise take the first result with Enter.
    pub fn locate_chat(&self, name: &str, hit_timeout: Duration) -> Result<()> {
        let modifier = if cfg!(target_os = "macos") {
            ModifierKey::Meta
        } else {
            ModifierKey::Ctrl
        };
        self.tab.press_key_with_modifiers("f", Some(&[modifier]))?;
        std::thread::sleep(Duration::from_secs(1));

        debug!(chat = name, "typing search query");
        self.tab.type_str(name)?;
        std::thread::sleep(Duration::from_secs(2));

        match self
            .tab
            .wait_for_element_with_custom_timeout(&selectors::search_hit(name), hit_timeout)
        {
            Ok(hit) => {
                hit.click().context("click search result")?;
                info!(chat = name, "search hit clicked");
            }
            Err(err) => {
                warn!(%err, "no titled search hit, taking the first result");
                self.tab.press_key("Enter")?;
            }
        }
        std::thread::sleep(Duration::from_secs(2));
        Ok(())
    }

    pub fn dom(&self) -> ChromeDom {
        ChromeDom {
            tab: self.tab.clone(),
        }
    }
}

/// Node handles are CDP node ids; each operation re-resolves the element,
/// so a handle whose node left the document reports [`DomError::Stale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(u32);

#[derive(Clone)]
pub struct ChromeDom {
    tab: Arc<Tab>,
}

impl ChromeDom {
    fn element(&self, node: &NodeHandle) -> DomResult<Element<'_>> {
        Element::new(&self.tab, node.0).map_err(|_| DomError::Stale)
    }
}

fn attr_from_pairs(pairs: &[String], name: &str) -> Option<String> {
    pairs
        .chunks_exact(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].clone())
}

impl Dom for ChromeDom {
    type Node = NodeHandle;

    fn find(&self, scope: Option<&NodeHandle>, selector: &str) -> DomResult<NodeHandle> {
        let found = match scope {
            Some(scope) => {
                let el = self.element(scope)?;
                el.find_element(selector)
            }
            None => self.tab.find_element(selector),
        };
        found
            .map(|el| NodeHandle(el.node_id))
            .map_err(|_| DomError::NotFound(selector.to_string()))
    }

    fn find_all(&self, scope: Option<&NodeHandle>, selector: &str) -> DomResult<Vec<NodeHandle>> {
        let found = match scope {
            Some(scope) => {
                let el = self.element(scope)?;
                el.find_elements(selector)
            }
            None => self.tab.find_elements(selector),
        };
        // a failed query reads as "nothing matched"
        Ok(found
            .map(|els| els.into_iter().map(|el| NodeHandle(el.node_id)).collect())
            .unwrap_or_default())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> DomResult<NodeHandle> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|el| NodeHandle(el.node_id))
            .map_err(|_| DomError::Timeout(timeout, selector.to_string()))
    }

    fn wait_visible(&self, node: &NodeHandle, timeout: Duration) -> DomResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible(node)? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DomError::Timeout(timeout, "visibility".to_string()));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    fn attribute(&self, node: &NodeHandle, name: &str) -> DomResult<Option<String>> {
        let el = self.element(node)?;
        let attrs = el.get_attributes().map_err(DomError::Backend)?;
        Ok(attrs.and_then(|pairs| attr_from_pairs(&pairs, name)))
    }

    fn text(&self, node: &NodeHandle) -> DomResult<String> {
        let el = self.element(node)?;
        el.get_inner_text().map_err(DomError::Backend)
    }

    fn scroll_into_view(&self, node: &NodeHandle) -> DomResult<()> {
        let el = self.element(node)?;
        el.scroll_into_view()
            .map(|_| ())
            .map_err(DomError::Backend)
    }

    fn is_visible(&self, node: &NodeHandle) -> DomResult<bool> {
        let el = self.element(node)?;
        Ok(el
            .get_box_model()
            .map(|b| b.width > 0.0 && b.height > 0.0)
            .unwrap_or(false))
    }
}
