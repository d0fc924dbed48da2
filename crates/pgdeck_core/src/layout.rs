/// Horizontal space reserved by the collapsed sidebar rail.
const COLLAPSED_MARGIN_PX: u32 = 60;
/// Horizontal space reserved by the expanded sidebar.
const EXPANDED_MARGIN_PX: u32 = 180;

/// Sidebar presence as observed in the shell at the moment the dialog opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SidebarMode {
    #[default]
    Collapsed,
    Expanded,
}

impl SidebarMode {
    /// Discrete style-class selector (1 = narrow layout, 2 = wide layout).
    pub fn indicator(self) -> u8 {
        match self {
            SidebarMode::Collapsed => 1,
            SidebarMode::Expanded => 2,
        }
    }
}

/// Resolved dialog geometry for one open/refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogLayout {
    pub width_px: u32,
    pub sidebar: SidebarMode,
}

impl DialogLayout {
    /// Compute the dialog width from the viewport width and whether the
    /// sidebar toggle element is present. Pure; callers must re-resolve on
    /// every open since the viewport can change between opens.
    pub fn resolve(viewport_px: u32, sidebar_toggle_present: bool) -> Self {
        if sidebar_toggle_present {
            Self {
                width_px: viewport_px.saturating_sub(EXPANDED_MARGIN_PX),
                sidebar: SidebarMode::Expanded,
            }
        } else {
            Self {
                width_px: viewport_px.saturating_sub(COLLAPSED_MARGIN_PX),
                sidebar: SidebarMode::Collapsed,
            }
        }
    }
}

/// Where the controller learns the current viewport and sidebar state.
///
/// The shell that embeds the dialog implements this against its windowing
/// layer; tests drive it directly.
pub trait LayoutProbe: Send + Sync {
    fn viewport_px(&self) -> u32;

    /// Whether the sidebar toggle element currently exists in the shell.
    fn sidebar_toggle_present(&self) -> bool;
}

/// Fixed probe for tests and headless embedding.
#[derive(Debug, Clone, Copy)]
pub struct StaticLayoutProbe {
    pub viewport_px: u32,
    pub sidebar_toggle_present: bool,
}

impl LayoutProbe for StaticLayoutProbe {
    fn viewport_px(&self) -> u32 {
        self.viewport_px
    }

    fn sidebar_toggle_present(&self) -> bool {
        self.sidebar_toggle_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_sidebar_width() {
        let layout = DialogLayout::resolve(1920, false);
        assert_eq!(layout.width_px, 1860);
        assert_eq!(layout.sidebar, SidebarMode::Collapsed);
        assert_eq!(layout.sidebar.indicator(), 1);
    }

    #[test]
    fn expanded_sidebar_width() {
        let layout = DialogLayout::resolve(1920, true);
        assert_eq!(layout.width_px, 1740);
        assert_eq!(layout.sidebar, SidebarMode::Expanded);
        assert_eq!(layout.sidebar.indicator(), 2);
    }

    #[test]
    fn tiny_viewport_saturates_to_zero() {
        assert_eq!(DialogLayout::resolve(40, false).width_px, 0);
        assert_eq!(DialogLayout::resolve(100, true).width_px, 0);
    }

    #[test]
    fn static_probe_reports_fixed_values() {
        let probe = StaticLayoutProbe {
            viewport_px: 1024,
            sidebar_toggle_present: true,
        };
        let layout = DialogLayout::resolve(probe.viewport_px(), probe.sidebar_toggle_present());
        assert_eq!(layout.width_px, 844);
        assert_eq!(layout.sidebar.indicator(), 2);
    }
}
