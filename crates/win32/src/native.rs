//! The Win32 side: hidden windows, `Shell_NotifyIconW`, popup menus and
//! the message loop.

use std::cell::RefCell;
use std::io;
use std::mem::{size_of, zeroed};
use std::os::windows::ffi::OsStrExt;
use std::ptr::{null, null_mut};
use std::rc::Rc;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Arc, mpsc};

use windows_sys::Win32::Foundation::{BOOL, FALSE, HWND, LPARAM, LRESULT, POINT, TRUE, WPARAM};
use windows_sys::Win32::System::Console::{CTRL_C_EVENT, SetConsoleCtrlHandler};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::Shell::{
    NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW, Shell_NotifyIconW,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    ChangeWindowMessageFilterEx, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyIcon,
    DestroyMenu, DestroyWindow, DispatchMessageW, GWLP_USERDATA, GetCursorPos, GetMessageW,
    HMENU, IDI_APPLICATION, IMAGE_ICON, InsertMenuItemW, LR_DEFAULTSIZE, LR_LOADFROMFILE,
    LR_SHARED, LoadIconW, LoadImageW, MENUITEMINFOW, MFS_CHECKED, MFS_DISABLED, MFT_RADIOCHECK,
    MFT_SEPARATOR, MFT_STRING, MIIM_FTYPE, MIIM_ID, MIIM_STATE, MIIM_STRING, MSG, MSGFLT_ALLOW,
    PostMessageW, PostQuitMessage, RegisterClassExW, RegisterWindowMessageW,
    SetForegroundWindow, TPM_BOTTOMALIGN, TPM_RETURNCMD, TPM_RIGHTALIGN, TrackPopupMenuEx,
    TranslateMessage, UnregisterClassW, WNDCLASSEXW, WS_POPUP,
};

use ultrasystray_core::{
    EventSink, IconSource, LifecycleState, Result, TrayCommand, TrayConfig, TrayError, TrayEvent,
    TrayHandle, TrayIcon,
};

use crate::icon::NotifyIcon;
use crate::menu::MenuEntry;
use crate::message::{
    MessageIds, TASKBAR_CREATED, WM_CREATE, WM_NCCREATE, WM_NULL, WM_STOP, WM_WAKE,
};
use crate::registry::{Registry, Token};
use crate::shell::{IconHandle, NotifyData, NotifyOp, Shell};
use crate::wide::{copy_into, to_wide};
use crate::window::{Routed, Shared, Slot, route};

/// `uID` of the single notification icon each window owns.
const ICON_ID: u32 = 1;

const CLASS_PREFIX: &str = "UltraSystray";

thread_local! {
    static REGISTRY: RefCell<Registry<Shared<NativeShell>>> = RefCell::new(Registry::new());
}

/// Window of the running icon, for the console control handler.
static CONSOLE_TARGET: AtomicIsize = AtomicIsize::new(0);

fn toolkit_error(call: &str) -> TrayError {
    TrayError::Toolkit(format!("{call} failed: {}", io::Error::last_os_error()))
}

#[cfg(target_pointer_width = "64")]
unsafe fn set_user_data(hwnd: HWND, value: isize) {
    use windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW;
    unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, value) };
}

#[cfg(target_pointer_width = "64")]
unsafe fn user_data(hwnd: HWND) -> isize {
    use windows_sys::Win32::UI::WindowsAndMessaging::GetWindowLongPtrW;
    unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) }
}

#[cfg(target_pointer_width = "32")]
unsafe fn set_user_data(hwnd: HWND, value: isize) {
    use windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongW;
    unsafe { SetWindowLongW(hwnd, GWLP_USERDATA, value as i32) };
}

#[cfg(target_pointer_width = "32")]
unsafe fn user_data(hwnd: HWND) -> isize {
    use windows_sys::Win32::UI::WindowsAndMessaging::GetWindowLongW;
    unsafe { GetWindowLongW(hwnd, GWLP_USERDATA) as isize }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCCREATE => return 1,
        WM_CREATE => return 0,
        _ => {}
    }
    let token = Token::from_raw(unsafe { user_data(hwnd) } as usize);
    let routed = REGISTRY
        .try_with(|registry| route(registry, token, msg, wparam, lparam))
        .unwrap_or(Routed::Default);
    match routed {
        Routed::Handled(result) => result,
        Routed::Default => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

unsafe extern "system" fn console_handler(ctrl_type: u32) -> BOOL {
    let hwnd = CONSOLE_TARGET.load(Ordering::SeqCst);
    if ctrl_type != CTRL_C_EVENT || hwnd == 0 {
        return FALSE;
    }
    unsafe { PostMessageW(hwnd as HWND, WM_STOP, 0, 0) };
    TRUE
}

/// Native resources of one icon: its two hidden windows and popup menu.
pub struct NativeShell {
    hwnd: HWND,
    menu_hwnd: HWND,
    hmenu: HMENU,
    /// Resource or stock icon loaded as shared.
    shared_icon: Option<isize>,
}

impl NativeShell {
    fn create(class_name: &[u16], taskbar_created: u32) -> Result<Self> {
        let hwnd = create_window(class_name, taskbar_created)?;
        let menu_hwnd = match create_window(class_name, taskbar_created) {
            Ok(menu_hwnd) => menu_hwnd,
            Err(e) => {
                unsafe { DestroyWindow(hwnd) };
                return Err(e);
            }
        };
        Ok(Self {
            hwnd,
            menu_hwnd,
            hmenu: null_mut(),
            shared_icon: None,
        })
    }

    fn destroy_menu(&mut self) {
        if !self.hmenu.is_null() {
            unsafe { DestroyMenu(self.hmenu) };
            self.hmenu = null_mut();
        }
    }
}

impl Drop for NativeShell {
    fn drop(&mut self) {
        self.destroy_menu();
        unsafe {
            DestroyWindow(self.menu_hwnd);
            DestroyWindow(self.hwnd);
        }
    }
}

/// Creates a top-level popup window. Broadcasts such as `TaskbarCreated`
/// never reach message-only windows.
fn create_window(class_name: &[u16], taskbar_created: u32) -> Result<HWND> {
    let hwnd = unsafe {
        CreateWindowExW(
            0,
            class_name.as_ptr(),
            null(),
            WS_POPUP,
            0,
            0,
            0,
            0,
            null_mut(),
            null_mut(),
            GetModuleHandleW(null()),
            null(),
        )
    };
    if hwnd.is_null() {
        return Err(toolkit_error("CreateWindowExW"));
    }
    // Elevated processes only see TaskbarCreated after opting in.
    if unsafe { ChangeWindowMessageFilterEx(hwnd, taskbar_created, MSGFLT_ALLOW, null_mut()) }
        == FALSE
    {
        tracing::warn!(error = %io::Error::last_os_error(), "could not allow TaskbarCreated");
    }
    Ok(hwnd)
}

impl Shell for NativeShell {
    fn notify_icon(&mut self, op: NotifyOp, data: &NotifyData) -> Result<()> {
        let mut nid: NOTIFYICONDATAW = unsafe { zeroed() };
        nid.cbSize = size_of::<NOTIFYICONDATAW>() as u32;
        nid.hWnd = self.hwnd;
        nid.uID = ICON_ID;
        nid.uFlags = data.flags;
        nid.uCallbackMessage = data.callback_message;
        if let Some(icon) = data.icon {
            nid.hIcon = icon.0 as _;
        }
        if let Some(tip) = &data.tip {
            copy_into(&mut nid.szTip, tip);
        }
        if let Some(balloon) = &data.balloon {
            copy_into(&mut nid.szInfoTitle, &balloon.title);
            copy_into(&mut nid.szInfo, &balloon.message);
        }
        let message = match op {
            NotifyOp::Add => NIM_ADD,
            NotifyOp::Modify => NIM_MODIFY,
            NotifyOp::Delete => NIM_DELETE,
        };
        if unsafe { Shell_NotifyIconW(message, &nid) } == FALSE {
            return Err(toolkit_error("Shell_NotifyIconW"));
        }
        Ok(())
    }

    fn load_icon(&mut self, source: &IconSource) -> Result<IconHandle> {
        match source {
            IconSource::File(path) => {
                let wide: Vec<u16> = path
                    .as_os_str()
                    .encode_wide()
                    .chain(std::iter::once(0))
                    .collect();
                let handle = unsafe {
                    LoadImageW(
                        null_mut(),
                        wide.as_ptr(),
                        IMAGE_ICON,
                        0,
                        0,
                        LR_DEFAULTSIZE | LR_LOADFROMFILE,
                    )
                };
                if handle.is_null() {
                    return Err(TrayError::Icon(format!(
                        "{}: {}",
                        path.display(),
                        io::Error::last_os_error()
                    )));
                }
                Ok(IconHandle(handle as isize))
            }
            IconSource::Named(name) => {
                let wide = to_wide(name);
                let resource = unsafe {
                    LoadImageW(
                        GetModuleHandleW(null()),
                        wide.as_ptr(),
                        IMAGE_ICON,
                        0,
                        0,
                        LR_DEFAULTSIZE | LR_SHARED,
                    )
                };
                let handle = if resource.is_null() {
                    tracing::debug!(
                        %name,
                        error = %io::Error::last_os_error(),
                        "no such icon resource, using the application icon"
                    );
                    unsafe { LoadIconW(null_mut(), IDI_APPLICATION) }
                } else {
                    resource
                };
                if handle.is_null() {
                    return Err(TrayError::Icon(format!(
                        "{name}: {}",
                        io::Error::last_os_error()
                    )));
                }
                // Shared handles belong to the system and are never destroyed.
                self.shared_icon = Some(handle as isize);
                Ok(IconHandle(handle as isize))
            }
        }
    }

    fn destroy_icon(&mut self, icon: IconHandle) {
        if self.shared_icon == Some(icon.0) {
            return;
        }
        unsafe { DestroyIcon(icon.0 as _) };
    }

    fn set_menu(&mut self, entries: &[MenuEntry]) -> Result<()> {
        self.destroy_menu();
        let hmenu = unsafe { CreatePopupMenu() };
        if hmenu.is_null() {
            return Err(toolkit_error("CreatePopupMenu"));
        }
        self.hmenu = hmenu;

        for (position, entry) in entries.iter().enumerate() {
            let mut label: Vec<u16> = Vec::new();
            let mut info: MENUITEMINFOW = unsafe { zeroed() };
            info.cbSize = size_of::<MENUITEMINFOW>() as u32;
            match entry {
                MenuEntry::Separator => {
                    info.fMask = MIIM_FTYPE;
                    info.fType = MFT_SEPARATOR;
                }
                MenuEntry::Item {
                    id,
                    label: text,
                    radio,
                    checked,
                    disabled,
                } => {
                    label = to_wide(text);
                    info.fMask = MIIM_ID | MIIM_STRING | MIIM_STATE | MIIM_FTYPE;
                    info.fType = MFT_STRING | (if *radio { MFT_RADIOCHECK } else { 0 });
                    info.fState = (if *checked { MFS_CHECKED } else { 0 })
                        | (if *disabled { MFS_DISABLED } else { 0 });
                    info.wID = *id;
                    info.cch = (label.len() - 1) as u32;
                    info.dwTypeData = label.as_mut_ptr();
                }
            }
            if unsafe { InsertMenuItemW(hmenu, position as u32, TRUE, &info) } == FALSE {
                return Err(toolkit_error("InsertMenuItemW"));
            }
        }
        Ok(())
    }

    fn track_menu(&mut self) -> Result<u32> {
        if self.hmenu.is_null() {
            return Ok(0);
        }
        // The popup misbehaves unless our window is in the foreground.
        unsafe { SetForegroundWindow(self.hwnd) };
        let mut point = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point) } == FALSE {
            return Err(toolkit_error("GetCursorPos"));
        }
        let command = unsafe {
            TrackPopupMenuEx(
                self.hmenu,
                TPM_RIGHTALIGN | TPM_BOTTOMALIGN | TPM_RETURNCMD,
                point.x,
                point.y,
                self.menu_hwnd,
                null(),
            )
        };
        // Lets the menu close properly when dismissed by clicking elsewhere.
        unsafe { PostMessageW(self.hwnd, WM_NULL, 0, 0) };
        Ok(command as u32)
    }

    fn post_quit(&mut self) {
        unsafe { PostQuitMessage(0) };
    }
}

/// Registered window class, unregistered on drop.
struct WindowClass {
    name: Vec<u16>,
}

impl WindowClass {
    fn register(id: &str) -> Result<Self> {
        let name = to_wide(&format!("{CLASS_PREFIX}-{id}"));
        let mut class: WNDCLASSEXW = unsafe { zeroed() };
        class.cbSize = size_of::<WNDCLASSEXW>() as u32;
        class.lpfnWndProc = Some(window_proc);
        class.hInstance = unsafe { GetModuleHandleW(null()) };
        class.lpszClassName = name.as_ptr();
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(toolkit_error("RegisterClassExW"));
        }
        Ok(Self { name })
    }
}

impl Drop for WindowClass {
    fn drop(&mut self) {
        unsafe { UnregisterClassW(self.name.as_ptr(), GetModuleHandleW(null())) };
    }
}

/// Tray icon backed by `Shell_NotifyIconW`.
///
/// The native icon only exists while [`TrayIcon::run`] is pumping
/// messages; [`TrayIcon::show`] just marks it visible.
pub struct Win32TrayIcon {
    config: TrayConfig,
    state: LifecycleState,
    events: EventSink,
    handle: TrayHandle,
    commands: Option<mpsc::Receiver<TrayCommand>>,
    /// Window the control handle wakes; 0 while not running.
    target: Arc<AtomicIsize>,
}

impl Win32TrayIcon {
    pub fn new(config: TrayConfig) -> Self {
        let target = Arc::new(AtomicIsize::new(0));
        let waker_target = Arc::clone(&target);
        let (handle, commands) = TrayHandle::new(move || {
            let hwnd = waker_target.load(Ordering::SeqCst);
            if hwnd != 0 {
                unsafe { PostMessageW(hwnd as HWND, WM_WAKE, 0, 0) };
            }
        });
        Self {
            config,
            state: LifecycleState::NotShown,
            events: EventSink::default(),
            handle,
            commands: Some(commands),
            target,
        }
    }

    fn run_loop(&mut self, commands: mpsc::Receiver<TrayCommand>) -> Result<()> {
        let id = self.config.ensure_id().to_string();
        let taskbar_created = unsafe { RegisterWindowMessageW(to_wide(TASKBAR_CREATED).as_ptr()) };
        let ids = MessageIds { taskbar_created };

        let class = WindowClass::register(&id)?;
        let shell = NativeShell::create(&class.name, taskbar_created)?;
        let hwnd = shell.hwnd;

        let icon = NotifyIcon::new(shell, self.config.clone(), self.handle.clone(), commands, ids)
            .with_events(self.events.clone());
        let entry: Shared<NativeShell> = Rc::new(Slot::new(icon));
        let token = REGISTRY.with(|registry| registry.borrow_mut().insert(Rc::clone(&entry)));
        unsafe { set_user_data(hwnd, token.to_raw() as isize) };

        self.target.store(hwnd as isize, Ordering::SeqCst);
        CONSOLE_TARGET.store(hwnd as isize, Ordering::SeqCst);
        if unsafe { SetConsoleCtrlHandler(Some(console_handler), TRUE) } == FALSE {
            tracing::warn!(error = %io::Error::last_os_error(), "could not install console handler");
        }

        tracing::info!(%id, "win32 tray icon running");
        let started = {
            let mut icon = entry.icon().borrow_mut();
            let started = icon.start().and_then(|()| icon.drain_commands());
            entry.replay(&mut icon);
            started
        };
        let pumped = started.and_then(|()| pump());

        unsafe { SetConsoleCtrlHandler(Some(console_handler), FALSE) };
        CONSOLE_TARGET.store(0, Ordering::SeqCst);
        self.target.store(0, Ordering::SeqCst);
        unsafe { set_user_data(hwnd, 0) };
        REGISTRY.with(|registry| registry.borrow_mut().remove(token));

        let mut icon = match Rc::try_unwrap(entry) {
            Ok(slot) => slot.into_icon(),
            Err(_) => return Err(TrayError::InvalidState("tray icon still in use".into())),
        };
        let finished = icon.finish();
        let failure = icon.take_failure();
        self.config = icon.into_config();
        drop(class);
        tracing::info!(%id, "win32 tray icon stopped");

        pumped?;
        if let Some(e) = failure {
            return Err(e);
        }
        finished
    }
}

fn pump() -> Result<()> {
    let mut msg: MSG = unsafe { zeroed() };
    loop {
        match unsafe { GetMessageW(&mut msg, null_mut(), 0, 0) } {
            0 => return Ok(()),
            -1 => return Err(toolkit_error("GetMessageW")),
            _ => unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}

impl TrayIcon for Win32TrayIcon {
    fn backend(&self) -> &'static str {
        "win32"
    }

    fn config(&self) -> &TrayConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut TrayConfig {
        &mut self.config
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn show(&mut self) -> Result<()> {
        self.state.show()
    }

    fn run(&mut self) -> Result<()> {
        self.state.show()?;
        let commands = self
            .commands
            .take()
            .ok_or_else(|| TrayError::InvalidState("tray loop already ran".into()))?;
        let result = self.run_loop(commands);
        self.state.hide();
        result
    }

    fn handle(&self) -> TrayHandle {
        self.handle.clone()
    }

    fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        self.events.subscribe()
    }
}
