//! 控制台输入（专用输入线程 + crossbeam 通道）
//!
//! rustyline 在输入线程内创建，保留历史记录；控制线程在等待确认/应答时
//! 不会被阻塞在 readline 上。读取期间终端处于 raw 模式，Ctrl+C 由 rustyline
//! 捕获，因此输入线程自己触发中断回调。

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::thread;
use std::time::Duration;

/// 历史记录文件
const HISTORY_PATH: &str = ".robstride_history";

/// 输入事件
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Line(String),
    /// exit / quit / Ctrl+D / Ctrl+C
    Exit,
}

/// 控制台输入
pub struct ConsoleInput {
    rx: Receiver<InputEvent>,
    _input_thread: thread::JoinHandle<Result<()>>,
}

impl ConsoleInput {
    /// 创建专用输入线程
    ///
    /// `on_interrupt` 在用户按下 Ctrl+C 时于输入线程内调用。
    pub fn new<F>(prompt: &str, on_interrupt: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = bounded::<InputEvent>(10);
        let prompt = prompt.to_string();

        let input_thread = thread::spawn(move || {
            let mut rl = DefaultEditor::new()
                .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;
            rl.load_history(HISTORY_PATH).ok(); // 首次运行没有历史文件

            loop {
                match rl.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if line == "exit" || line == "quit" {
                            let _ = tx.send(InputEvent::Exit);
                            break;
                        }
                        let _ = rl.add_history_entry(line.as_str());
                        if tx.send(InputEvent::Line(line)).is_err() {
                            break; // 控制线程已退出
                        }
                    },
                    Err(ReadlineError::Interrupted) => {
                        println!("^C");
                        on_interrupt();
                        let _ = tx.send(InputEvent::Exit);
                        break;
                    },
                    Err(ReadlineError::Eof) => {
                        let _ = tx.send(InputEvent::Exit);
                        break;
                    },
                    Err(err) => {
                        eprintln!("Error: {:?}", err);
                        let _ = tx.send(InputEvent::Exit);
                        break;
                    },
                }
            }

            rl.save_history(HISTORY_PATH).ok();
            Ok(())
        });

        Self {
            rx,
            _input_thread: input_thread,
        }
    }

    /// 阻塞等待下一条输入；输入线程退出时视为 Exit
    pub fn recv(&self) -> InputEvent {
        self.rx.recv().unwrap_or(InputEvent::Exit)
    }

    /// 带超时等待输入（原始控制台需要同时回显入站数据）
    pub fn recv_timeout(&self, timeout: Duration) -> Option<InputEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(InputEvent::Exit),
        }
    }
}
